use crate::error::{AeroCellErrorCode, DefaultAeroCellError};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, with_engine_mut};
use crate::instance::{check_coefficient, AeroCellInstance};

/// Block the half-open cell rectangle `[x1, x2) × [y1, y2)`.
///
/// The rectangle is clipped to the grid. Inverted or fully outside rectangles
/// change nothing and still return `Ok`.
///
/// Thread-safe: acquires the `RwLock` write lock.
///
/// Returns
/// - `AeroCellErrorCode::Ok` (0) on success
/// - `AeroCellErrorCode::NullPointer` if `ptr` is null
/// - `AeroCellErrorCode::LockPoisoned` if the internal lock is poisoned
#[no_mangle]
pub extern "C" fn aerocell_add_obstacle(
    ptr: *const AeroCellInstance,
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
) -> AeroCellErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_engine_mut(instance, |engine| {
            engine.add_obstacle(x1, y1, x2, y2);
        })?;
        Ok::<(), DefaultAeroCellError>(())
    })
}

/// Set the concentration of cell `(x, y)` to `concentration`.
///
/// Coordinates outside the grid are ignored. `out_written` (optional) receives
/// whether a cell was written.
///
/// Returns
/// - `AeroCellErrorCode::Ok` (0) on success, including out-of-range coordinates
/// - `AeroCellErrorCode::NullPointer` if `ptr` is null
/// - `AeroCellErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `aerocell_new` or null.
/// - `out_written` if non-null, must be a valid pointer to a `bool`.
#[no_mangle]
pub unsafe extern "C" fn aerocell_emit(
    ptr: *const AeroCellInstance,
    x: i64,
    y: i64,
    concentration: f32,
    out_written: *mut bool,
) -> AeroCellErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let written = with_engine_mut(instance, |engine| engine.emit(x, y, concentration))?;
        if !out_written.is_null() {
            unsafe {
                *out_written = written;
            }
        }
        Ok::<(), DefaultAeroCellError>(())
    })
}

/// Advance the field by one step.
///
/// Thread-safe: acquires the `RwLock` write lock for the whole step.
///
/// Returns
/// - `AeroCellErrorCode::Ok` (0) on success
/// - `AeroCellErrorCode::NullPointer` if `ptr` is null
/// - `AeroCellErrorCode::LockPoisoned` if the internal lock is poisoned
#[no_mangle]
pub extern "C" fn aerocell_update(ptr: *const AeroCellInstance) -> AeroCellErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_engine_mut(instance, |engine| engine.update())?;
        Ok::<(), DefaultAeroCellError>(())
    })
}

/// Advance the field by `steps` steps under a single write lock.
///
/// `steps == 0` is a no-op.
#[no_mangle]
pub extern "C" fn aerocell_update_steps(
    ptr: *const AeroCellInstance,
    steps: u32,
) -> AeroCellErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_engine_mut(instance, |engine| {
            for _ in 0..steps {
                engine.update();
            }
        })?;
        Ok::<(), DefaultAeroCellError>(())
    })
}

/// Zero every concentration cell and the step counter. Obstacles are kept.
#[no_mangle]
pub extern "C" fn aerocell_reset(ptr: *const AeroCellInstance) -> AeroCellErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_engine_mut(instance, |engine| engine.reset())?;
        Ok::<(), DefaultAeroCellError>(())
    })
}

/// Change the diffusion coefficient used by the next update.
///
/// Returns
/// - `AeroCellErrorCode::Ok` (0) on success
/// - `AeroCellErrorCode::NullPointer` if `ptr` is null
/// - `AeroCellErrorCode::InvalidParameter` if `diffusion` is NaN or infinite
/// - `AeroCellErrorCode::LockPoisoned` if the internal lock is poisoned
#[no_mangle]
pub extern "C" fn aerocell_set_diffusion(
    ptr: *const AeroCellInstance,
    diffusion: f32,
) -> AeroCellErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        check_coefficient("diffusion", diffusion)?;
        with_engine_mut(instance, |engine| engine.set_diffusion(diffusion))?;
        Ok::<(), DefaultAeroCellError>(())
    })
}

/// Change the decay coefficient used by the next update.
///
/// Same error contract as `aerocell_set_diffusion`.
#[no_mangle]
pub extern "C" fn aerocell_set_decay(
    ptr: *const AeroCellInstance,
    decay: f32,
) -> AeroCellErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        check_coefficient("decay", decay)?;
        with_engine_mut(instance, |engine| engine.set_decay(decay))?;
        Ok::<(), DefaultAeroCellError>(())
    })
}
