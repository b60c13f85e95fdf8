use crate::error::{with_last_error_mut, AeroCellError, AeroCellErrorCode, DefaultAeroCellError};
use crate::instance::AeroCellInstance;
use aerocell_core::DiffusionGridEngine;
use std::ffi::CString;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl AeroCellError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl AeroCellError) -> AeroCellErrorCode {
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
/// Called on successful operations.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = AeroCellErrorCode::Ok;
    });
}

/// Record the error of a failed result, clear it on success.
pub(crate) fn track_result<T>(
    result: Result<T, DefaultAeroCellError>,
) -> Result<T, AeroCellErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(error) => Err(track_error(&error)),
    }
}

/// Run an FFI body and collapse its result into an error code.
pub(crate) fn handle_ffi_result_error<F>(body: F) -> AeroCellErrorCode
where
    F: FnOnce() -> Result<(), DefaultAeroCellError>,
{
    match track_result(body()) {
        Ok(()) => AeroCellErrorCode::Ok,
        Err(code) => code,
    }
}

/// Borrow an instance from a caller pointer.
///
/// The pointer must be null or come from `aerocell_new`/`aerocell_new_preset`
/// and not yet be passed to `aerocell_destroy`.
pub(crate) fn instance_from_ptr<'a>(
    ptr: *const AeroCellInstance,
) -> Result<&'a AeroCellInstance, DefaultAeroCellError> {
    if ptr.is_null() {
        return Err(DefaultAeroCellError::null_pointer("ptr"));
    }
    // SAFETY: non-null, and the caller contract above guarantees it points to
    // a live instance created by `Box::into_raw`.
    Ok(unsafe { &*ptr })
}

/// Run `func` under the engine's read lock.
pub(crate) fn with_engine<F, T>(
    instance: &AeroCellInstance,
    func: F,
) -> Result<T, DefaultAeroCellError>
where
    F: FnOnce(&DiffusionGridEngine) -> T,
{
    let engine = instance
        .engine
        .read()
        .map_err(|_| DefaultAeroCellError::lock_poisoned("RwLock"))?;
    Ok(func(&engine))
}

/// Run `func` under the engine's write lock.
pub(crate) fn with_engine_mut<F, T>(
    instance: &AeroCellInstance,
    func: F,
) -> Result<T, DefaultAeroCellError>
where
    F: FnOnce(&mut DiffusionGridEngine) -> T,
{
    let mut engine = instance
        .engine
        .write()
        .map_err(|_| DefaultAeroCellError::lock_poisoned("RwLock"))?;
    Ok(func(&mut engine))
}
