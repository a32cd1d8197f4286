use super::error::PdfError;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::sync::Mutex;

/// Outcome of the first attempt to bind the system pdfium library.
enum InitializationState {
    Uninitialized,
    Initialized,
    Failed(String),
}

/// Binding happens once; a failure is remembered so later calls fail fast
/// instead of probing the filesystem again.
static PDFIUM_STATE: Lazy<Mutex<InitializationState>> = Lazy::new(|| Mutex::new(InitializationState::Uninitialized));

/// Fresh bindings to the system pdfium library.
///
/// `map_err` chooses the `PdfError` variant reported to the caller and
/// `context` names the operation in the message.
pub(crate) fn bind_pdfium(
    map_err: fn(String) -> PdfError,
    context: &'static str,
) -> Result<Box<dyn PdfiumLibraryBindings>, PdfError> {
    let mut state = PDFIUM_STATE
        .lock()
        .map_err(|e| map_err(format!("Failed to acquire lock on Pdfium state ({}): {}", context, e)))?;

    if let InitializationState::Failed(err) = &*state {
        return Err(map_err(format!(
            "Pdfium initialization previously failed ({}): {}",
            context, err
        )));
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            *state = InitializationState::Initialized;
            Ok(bindings)
        }
        Err(e) => {
            let message = e.to_string();
            if matches!(*state, InitializationState::Uninitialized) {
                *state = InitializationState::Failed(message.clone());
            }
            Err(map_err(format!("Pdfium initialization failed ({}): {}", context, message)))
        }
    }
}
