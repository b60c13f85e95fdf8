use aerocell_core::{DiffusionGridEngine, EngineConfig, MapPreset};
use std::ptr;
use std::sync::RwLock;

use crate::error::{AeroCellErrorCode, DefaultAeroCellError};
use crate::helpers::{track_error, track_result, with_engine_mut};

/// The diffusion engine context handed to C callers.
///
/// # Thread Safety
/// `AeroCellInstance` can be shared across threads. The engine sits behind an
/// `RwLock`:
/// - **Queries** (`aerocell_get_stats`, `aerocell_copy_concentration`) take a read lock
/// - **Mutations** (`aerocell_update`, `aerocell_emit`, ...) take the write lock
///
/// ## Example (C)
/// ```c
/// AeroCellInstance* sim = NULL;
/// if (aerocell_new_preset(50, 50, 0.2f, 0.005f, Complex, &sim) != Ok) {
///     fprintf(stderr, "%s\n", aerocell_get_last_error());
///     return;
/// }
/// aerocell_emit(sim, 10, 25, 10.0f);
/// for (int i = 0; i < 200; i++) {
///     aerocell_update(sim);
/// }
/// aerocell_destroy(sim);
/// ```
pub struct AeroCellInstance {
    pub(crate) engine: RwLock<DiffusionGridEngine>,
}

/// Obstacle layout applied by `aerocell_new_preset`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeroCellMapPreset {
    /// No obstacles.
    Open = 0,
    /// A single vertical wall.
    Simple = 1,
    /// Five walls forming a maze-like layout.
    Complex = 2,
}

impl From<AeroCellMapPreset> for MapPreset {
    fn from(preset: AeroCellMapPreset) -> Self {
        match preset {
            AeroCellMapPreset::Open => MapPreset::Open,
            AeroCellMapPreset::Simple => MapPreset::Simple,
            AeroCellMapPreset::Complex => MapPreset::Complex,
        }
    }
}

impl AeroCellInstance {
    /// Creates a new instance with an empty field and no obstacles.
    ///
    /// # Errors
    ///
    /// Returns `AeroCellErrorCode::InvalidDimensions` if either dimension is
    /// not positive or the grid cannot be addressed, and
    /// `AeroCellErrorCode::InvalidParameter` for a non-finite coefficient.
    pub(crate) fn new(
        width: i32,
        height: i32,
        diffusion: f32,
        decay: f32,
    ) -> Result<Box<Self>, DefaultAeroCellError> {
        let (Ok(w), Ok(h)) = (usize::try_from(width), usize::try_from(height)) else {
            return Err(DefaultAeroCellError::invalid_dimensions(width, height));
        };

        check_coefficient("diffusion", diffusion)?;
        check_coefficient("decay", decay)?;

        let engine = DiffusionGridEngine::new(EngineConfig::new(w, h, diffusion, decay))?;

        Ok(Box::new(Self {
            engine: RwLock::new(engine),
        }))
    }
}

/// Reject NaN and infinite coefficients at the C boundary.
pub(crate) fn check_coefficient(name: &str, value: f32) -> Result<(), DefaultAeroCellError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DefaultAeroCellError::non_finite_coefficient(name, value))
    }
}

/// Write the outcome of an instance constructor to `out_instance`.
///
/// # Safety
/// `out_instance` must be non-null and writable.
unsafe fn publish_instance(
    result: Result<Box<AeroCellInstance>, DefaultAeroCellError>,
    out_instance: *mut *mut AeroCellInstance,
) -> AeroCellErrorCode {
    match track_result(result) {
        Ok(instance) => {
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            AeroCellErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                // Set to null on error (per documentation contract)
                *out_instance = ptr::null_mut();
            }
            code
        }
    }
}

/// Create a new `AeroCell` engine and return it via out-parameter.
///
/// - Returns `AeroCellErrorCode::Ok` (0) on success with a valid instance in `out_instance`
/// - Returns a non-zero error code on failure with `out_instance` set to null
///
/// Parameters
/// - `width`, `height`: grid size in cells, both must be positive
/// - `diffusion`: fraction of a cell replaced by its neighbour average each step
/// - `decay`: fraction of concentration removed each step
/// - `out_instance`: pointer receiving the instance, must be non-null
///
/// Returns
/// - `AeroCellErrorCode::Ok` (0) on success
/// - `AeroCellErrorCode::NullPointer` if `out_instance` is null
/// - `AeroCellErrorCode::InvalidDimensions` if `width` or `height` is not positive,
///   or the grid is too large to allocate
/// - `AeroCellErrorCode::InvalidParameter` if `diffusion` or `decay` is not finite
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller owns the returned instance and MUST call `aerocell_destroy`
///   exactly once.
#[no_mangle]
pub unsafe extern "C" fn aerocell_new(
    width: i32,
    height: i32,
    diffusion: f32,
    decay: f32,
    out_instance: *mut *mut AeroCellInstance,
) -> AeroCellErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultAeroCellError::null_pointer("out_instance"));
    }

    unsafe {
        publish_instance(
            AeroCellInstance::new(width, height, diffusion, decay),
            out_instance,
        )
    }
}

/// Create an engine and stamp the obstacles of `preset` onto it.
///
/// Same contract as `aerocell_new`. Preset rectangles falling outside a small
/// grid are clipped.
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller owns the returned instance and MUST call `aerocell_destroy`
///   exactly once.
#[no_mangle]
pub unsafe extern "C" fn aerocell_new_preset(
    width: i32,
    height: i32,
    diffusion: f32,
    decay: f32,
    preset: AeroCellMapPreset,
    out_instance: *mut *mut AeroCellInstance,
) -> AeroCellErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultAeroCellError::null_pointer("out_instance"));
    }

    let result = AeroCellInstance::new(width, height, diffusion, decay).and_then(|instance| {
        with_engine_mut(&instance, |engine| MapPreset::from(preset).apply(engine))?;
        Ok(instance)
    });

    unsafe { publish_instance(result, out_instance) }
}

/// Destroys an instance previously created by `aerocell_new` or `aerocell_new_preset`.
///
/// If `ptr` is null this function is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `aerocell_new` or `aerocell_new_preset`.
/// - The pointer MUST NOT have been freed already.
/// - After this call the caller must not use the pointer again.
#[no_mangle]
pub unsafe extern "C" fn aerocell_destroy(ptr: *mut AeroCellInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: the pointer was produced by `Box::into_raw` in `publish_instance`
    // and has not been freed, so rebuilding the Box reclaims ownership.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}
