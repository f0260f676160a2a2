//! Application state and dependency injection.

use outlet_rig::chat::ChatService;
use outlet_rig::rag::InitializationGuard;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    chat_service: ChatService,
    initialization_guard: InitializationGuard,
}

impl ServiceState {
    /// Creates the state around a wired chat service.
    pub fn new(chat_service: ChatService) -> Self {
        let initialization_guard = chat_service.guard().clone();

        Self {
            chat_service,
            initialization_guard,
        }
    }

    /// Returns the chat service.
    pub fn chat_service(&self) -> &ChatService {
        &self.chat_service
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(chat_service: ChatService);
impl_di!(initialization_guard: InitializationGuard);
