//! Mock invoice provider for testing.
//!
//! Records every request and returns either a generated invoice or an
//! injected error.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{CreateInvoiceRequest, Invoice, InvoiceError, InvoiceProvider};

#[derive(Default)]
struct MockState {
    requests: Vec<CreateInvoiceRequest>,
    next_error: Option<InvoiceError>,
}

/// Mock invoice provider.
///
/// ```ignore
/// let mock = MockInvoiceProvider::new();
/// mock.set_error(InvoiceError::Network("down".into()));
/// ```
#[derive(Clone, Default)]
pub struct MockInvoiceProvider {
    inner: Arc<Mutex<MockState>>,
}

impl MockInvoiceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call with `error`.
    pub fn set_error(&self, error: InvoiceError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CreateInvoiceRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }
}

#[async_trait]
impl InvoiceProvider for MockInvoiceProvider {
    async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<Invoice, InvoiceError> {
        let mut state = self.inner.lock().unwrap();
        state.requests.push(request);

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        let n = state.requests.len();
        Ok(Invoice {
            id: format!("mock_invoice_{}", n),
            payment_request: format!("lnbc_mock_{}", n),
        })
    }
}
