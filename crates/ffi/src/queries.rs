use aerocell_core::EngineStats;

use crate::error::{AeroCellErrorCode, DefaultAeroCellError};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, track_error, with_engine};
use crate::instance::AeroCellInstance;

#[repr(C)]
/// FFI-friendly snapshot of the engine's summary statistics.
/// Keep this layout stable for C/C++/C# consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AeroCellStats {
    /// Number of completed updates since creation or the last reset.
    pub step_count: u64,

    /// Sum of all cell concentrations.
    pub total_mass: f64,

    /// Largest cell concentration.
    pub max_concentration: f32,

    /// Number of blocked cells.
    pub obstacle_cells: usize,

    /// Wall time of the most recent update (milliseconds).
    pub last_step_time_ms: f64,

    /// Mean update wall time since creation (milliseconds).
    pub mean_step_time_ms: f64,
}

impl From<EngineStats> for AeroCellStats {
    fn from(stats: EngineStats) -> Self {
        Self {
            step_count: stats.step_count,
            total_mass: stats.total_mass,
            max_concentration: stats.max_concentration,
            obstacle_cells: stats.obstacle_cells,
            last_step_time_ms: stats.last_step_time_ms,
            mean_step_time_ms: stats.mean_step_time_ms,
        }
    }
}

#[no_mangle]
/// Write the grid size in cells to `out_width` and `out_height`.
///
/// Uses the same `int32_t` type `aerocell_new` takes, so the values round-trip.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `aerocell_new` or null.
/// - `out_width` and `out_height` must be valid, non-null pointers to `i32`.
pub unsafe extern "C" fn aerocell_get_dimensions(
    ptr: *const AeroCellInstance,
    out_width: *mut i32,
    out_height: *mut i32,
) -> AeroCellErrorCode {
    if out_width.is_null() {
        return track_error(&DefaultAeroCellError::null_pointer("out_width"));
    }
    if out_height.is_null() {
        return track_error(&DefaultAeroCellError::null_pointer("out_height"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let (width, height) = with_engine(instance, |engine| (engine.width(), engine.height()))?;
        let (Ok(width), Ok(height)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(DefaultAeroCellError::invalid_parameter(format!(
                "Grid of {width}x{height} cells does not fit in int32_t dimensions"
            )));
        };
        unsafe {
            *out_width = width;
            *out_height = height;
        }
        Ok::<(), DefaultAeroCellError>(())
    })
}

#[no_mangle]
/// Fill `out_stats` with the current summary statistics.
///
/// Thread-safe: acquires the `RwLock` read lock.
///
/// Returns
/// - `AeroCellErrorCode::Ok` (0) on success
/// - `AeroCellErrorCode::NullPointer` if `ptr` or `out_stats` is null
/// - `AeroCellErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `aerocell_new` or null.
/// - `out_stats` must be a valid, non-null pointer to an `AeroCellStats`.
pub unsafe extern "C" fn aerocell_get_stats(
    ptr: *const AeroCellInstance,
    out_stats: *mut AeroCellStats,
) -> AeroCellErrorCode {
    if out_stats.is_null() {
        return track_error(&DefaultAeroCellError::null_pointer("out_stats"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let stats = with_engine(instance, |engine| AeroCellStats::from(engine.stats()))?;
        unsafe {
            *out_stats = stats;
        }
        Ok::<(), DefaultAeroCellError>(())
    })
}

#[no_mangle]
/// Read the concentration of cell `(x, y)`.
///
/// - `out_value` receives the concentration, or 0 outside the grid.
/// - `out_in_bounds` (optional) receives whether `(x, y)` lies on the grid.
///   Out-of-range coordinates are not an error.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `aerocell_new` or null.
/// - `out_value` must be a valid, non-null pointer to an `f32`.
/// - `out_in_bounds` if non-null, must be a valid pointer to a `bool`.
pub unsafe extern "C" fn aerocell_get_concentration_at(
    ptr: *const AeroCellInstance,
    x: i64,
    y: i64,
    out_value: *mut f32,
    out_in_bounds: *mut bool,
) -> AeroCellErrorCode {
    if out_value.is_null() {
        return track_error(&DefaultAeroCellError::null_pointer("out_value"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let value = with_engine(instance, |engine| engine.concentration_at(x, y))?;
        unsafe {
            *out_value = value.unwrap_or(0.0);
            if !out_in_bounds.is_null() {
                *out_in_bounds = value.is_some();
            }
        }
        Ok::<(), DefaultAeroCellError>(())
    })
}

#[no_mangle]
/// Copy the concentration field into a caller-owned buffer.
///
/// The layout is row-major: cell `(x, y)` lands at `buffer[y * width + x]`.
/// Only the first `width * height` entries are written.
///
/// Returns
/// - `AeroCellErrorCode::Ok` (0) on success
/// - `AeroCellErrorCode::NullPointer` if `ptr` or `buffer` is null
/// - `AeroCellErrorCode::BufferTooSmall` if `len < width * height`
/// - `AeroCellErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `aerocell_new` or null.
/// - `buffer` must point to `len` writable `f32` values.
pub unsafe extern "C" fn aerocell_copy_concentration(
    ptr: *const AeroCellInstance,
    buffer: *mut f32,
    len: usize,
) -> AeroCellErrorCode {
    if buffer.is_null() {
        return track_error(&DefaultAeroCellError::null_pointer("buffer"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_engine(instance, |engine| {
            let cells = engine.concentration().as_slice();
            if len < cells.len() {
                return Err(DefaultAeroCellError::buffer_too_small("buffer", cells.len(), len));
            }
            // SAFETY: non-null and the caller guarantees `len` writable values,
            // which we just checked covers the whole grid.
            let out = unsafe { std::slice::from_raw_parts_mut(buffer, cells.len()) };
            out.copy_from_slice(cells);
            Ok(())
        })?
    })
}

#[no_mangle]
/// Copy the obstacle mask into a caller-owned buffer.
///
/// Same layout and error contract as `aerocell_copy_concentration`.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `aerocell_new` or null.
/// - `buffer` must point to `len` writable `bool` values.
pub unsafe extern "C" fn aerocell_copy_obstacles(
    ptr: *const AeroCellInstance,
    buffer: *mut bool,
    len: usize,
) -> AeroCellErrorCode {
    if buffer.is_null() {
        return track_error(&DefaultAeroCellError::null_pointer("buffer"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_engine(instance, |engine| {
            let cells = engine.obstacles().as_slice();
            if len < cells.len() {
                return Err(DefaultAeroCellError::buffer_too_small("buffer", cells.len(), len));
            }
            // SAFETY: see `aerocell_copy_concentration`.
            let out = unsafe { std::slice::from_raw_parts_mut(buffer, cells.len()) };
            out.copy_from_slice(cells);
            Ok(())
        })?
    })
}
