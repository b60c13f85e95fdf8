use aerocell_core::EngineError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
pub(crate) trait AeroCellError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> AeroCellErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `AeroCellError` for the FFI error scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultAeroCellError {
    code: AeroCellErrorCode,
    msg: String,
}

impl DefaultAeroCellError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"ptr"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: AeroCellErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: AeroCellErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for invalid parameter.
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: AeroCellErrorCode::InvalidParameter,
            msg: message,
        }
    }

    /// Create error for a non-finite engine coefficient.
    pub fn non_finite_coefficient(param_name: &str, value: f32) -> Self {
        Self::invalid_parameter(format!("Parameter '{param_name}' must be finite, got {value}"))
    }

    /// Create error for a grid shape that cannot hold any cell.
    pub fn invalid_dimensions(width: i32, height: i32) -> Self {
        Self {
            code: AeroCellErrorCode::InvalidDimensions,
            msg: format!("Grid dimensions must be positive, got {width}x{height}"),
        }
    }

    /// Create error for a caller buffer shorter than the grid.
    ///
    /// # Arguments
    /// * `param_name` - The buffer parameter (e.g., `"buffer"`)
    /// * `required` - Cells needed
    /// * `provided` - Cells the caller supplied
    pub fn buffer_too_small(param_name: &str, required: usize, provided: usize) -> Self {
        Self {
            code: AeroCellErrorCode::BufferTooSmall,
            msg: format!("Buffer '{param_name}' holds {provided} cells, {required} required"),
        }
    }
}

impl From<EngineError> for DefaultAeroCellError {
    fn from(error: EngineError) -> Self {
        Self {
            code: AeroCellErrorCode::InvalidDimensions,
            msg: error.to_string(),
        }
    }
}

impl AeroCellError for DefaultAeroCellError {
    fn code(&self) -> AeroCellErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by `AeroCell` functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeroCellErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: internal synchronization primitive was poisoned by a panic.
    LockPoisoned = 2,

    /// Grid width and height must both be positive.
    InvalidDimensions = 3,

    /// Invalid parameter passed to function.
    InvalidParameter = 4,

    /// Output buffer shorter than `width * height`.
    BufferTooSmall = 5,
}

impl From<DefaultAeroCellError> for AeroCellErrorCode {
    fn from(error: DefaultAeroCellError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The CString is stored here so the pointer handed out stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, AeroCellErrorCode)> =
        const { RefCell::new((None, AeroCellErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, AeroCellErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, AeroCellErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if an error occurred.
/// - `null` if the last call on this thread succeeded.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread that
/// sets or clears the error. **DO NOT FREE THIS POINTER**.
///
/// Example:
/// ```c
/// AeroCellInstance* sim = NULL;
/// if (aerocell_new(0, 50, 0.1f, 0.005f, &sim) != Ok) {
///     const char* error = aerocell_get_last_error();
///     if (error) {
///         printf("AeroCell creation failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn aerocell_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code (`Ok` if the last call succeeded).
#[no_mangle]
pub extern "C" fn aerocell_get_last_error_code() -> AeroCellErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
