//! C API layer for the PLY reader
//!
//! This module exposes the `ply_reader_*` function surface used by native
//! hosts. A reader is an opaque handle created by [`ply_reader_create`] and
//! released exactly once with [`ply_reader_destroy`].
//!
//! Functions returning `bool` report failure as `false` and record a message
//! retrievable with [`ply_reader_get_last_error`]. Destination buffers are
//! always passed with their capacity in elements, which is checked before
//! anything is written.
//!
//! Destination type codes: 0 int8, 1 uint8, 2 int16, 3 uint16, 4 int32,
//! 5 uint32, 6 float32, 7 float64.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::ply_types::ScalarType;
use crate::reader::{LoadedElement, PlyReader};
use crate::status::{PlyError, PlyResult};

/// Opaque reader handle.
pub struct PlyReaderHandle {
    reader: Option<PlyReader>,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

/// Sets the last error message
fn set_last_error(error_msg: &str) {
    let msg = CString::new(error_msg.replace('\0', " ")).ok();
    LAST_ERROR.with(|last_error| {
        *last_error.borrow_mut() = msg;
    });
}

/// Records the error of a failed call and maps the result to a C flag.
fn report<T>(result: PlyResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            set_last_error(&error.to_string());
            None
        }
    }
}

fn reader_ref<'a>(reader: *const PlyReaderHandle) -> Option<&'a PlyReader> {
    if reader.is_null() {
        set_last_error("Reader handle is null");
        return None;
    }
    // Safety: non-null handles come from `ply_reader_create`.
    unsafe { (*reader).reader.as_ref() }
}

fn reader_mut<'a>(reader: *mut PlyReaderHandle) -> Option<&'a mut PlyReader> {
    if reader.is_null() {
        set_last_error("Reader handle is null");
        return None;
    }
    // Safety: non-null handles come from `ply_reader_create`.
    unsafe { (*reader).reader.as_mut() }
}

fn loaded<'a>(reader: *const PlyReaderHandle) -> Option<LoadedElement<'a>> {
    report(reader_ref(reader)?.require_loaded())
}

/// Narrows a count to the C return type. Counts past `u32::MAX` record an
/// error and come back as zero.
fn count_to_c(count: usize) -> u32 {
    u32::try_from(count).unwrap_or_else(|_| {
        set_last_error(&format!("Count {} does not fit in 32 bits", count));
        0
    })
}

fn write_indices(out: *mut u32, indices: &[u32]) -> bool {
    if out.is_null() {
        set_last_error("Property index output is null");
        return false;
    }
    // Safety: the caller provides room for at least `indices.len()` values.
    unsafe { ptr::copy_nonoverlapping(indices.as_ptr(), out, indices.len()) };
    true
}

/// Runs `$body` with `$out` bound to `$dest` viewed as a slice of the Rust
/// type matching `$ty`.
macro_rules! with_dest_slice {
    (@typed $t:ty, $dest:expr, $len:expr, $out:ident, $body:expr) => {{
        // Safety: the caller guarantees `dest` points to `len` aligned values
        // of the requested type.
        let $out: &mut [$t] = unsafe { std::slice::from_raw_parts_mut($dest as *mut $t, $len) };
        $body
    }};
    ($ty:expr, $dest:expr, $len:expr, |$out:ident| $body:expr) => {
        match $ty {
            ScalarType::Int8 => with_dest_slice!(@typed i8, $dest, $len, $out, $body),
            ScalarType::Uint8 => with_dest_slice!(@typed u8, $dest, $len, $out, $body),
            ScalarType::Int16 => with_dest_slice!(@typed i16, $dest, $len, $out, $body),
            ScalarType::Uint16 => with_dest_slice!(@typed u16, $dest, $len, $out, $body),
            ScalarType::Int32 => with_dest_slice!(@typed i32, $dest, $len, $out, $body),
            ScalarType::Uint32 => with_dest_slice!(@typed u32, $dest, $len, $out, $body),
            ScalarType::Float32 => with_dest_slice!(@typed f32, $dest, $len, $out, $body),
            ScalarType::Float64 => with_dest_slice!(@typed f64, $dest, $len, $out, $body),
        }
    };
}

fn parse_dest_type(tag: c_int) -> PlyResult<ScalarType> {
    ScalarType::from_tag(tag)
        .ok_or_else(|| PlyError::TypeUnsupported(format!("destination type code {}", tag)))
}

fn check_dest(dest: *mut c_void) -> PlyResult<()> {
    if dest.is_null() {
        return Err(PlyError::BufferSizeViolation { required: 1, provided: 0 });
    }
    Ok(())
}

// ===== Lifecycle =====

/// Opens `filename` and parses its header.
///
/// Returns null only if the file cannot be opened. A file with a corrupted
/// header still yields a handle for which [`ply_reader_valid`] is false.
#[no_mangle]
pub extern "C" fn ply_reader_create(filename: *const c_char) -> *mut PlyReaderHandle {
    if filename.is_null() {
        set_last_error("Filename is null");
        return ptr::null_mut();
    }
    // Safety: the caller passes a NUL-terminated string.
    let filename = match unsafe { CStr::from_ptr(filename) }.to_str() {
        Ok(name) => name,
        Err(_) => {
            set_last_error("Filename is not valid UTF-8");
            return ptr::null_mut();
        }
    };

    let reader = match PlyReader::open(filename) {
        Ok(reader) => Some(reader),
        Err(err @ PlyError::FileOpenFailed(_)) => {
            set_last_error(&err.to_string());
            return ptr::null_mut();
        }
        Err(err) => {
            set_last_error(&err.to_string());
            None
        }
    };
    Box::into_raw(Box::new(PlyReaderHandle { reader }))
}

/// Releases a handle from [`ply_reader_create`]. Null is ignored.
#[no_mangle]
pub extern "C" fn ply_reader_destroy(reader: *mut PlyReaderHandle) {
    if reader.is_null() {
        return;
    }
    // Safety: the handle was created by `Box::into_raw` in `ply_reader_create`.
    drop(unsafe { Box::from_raw(reader) });
}

#[no_mangle]
pub extern "C" fn ply_reader_valid(reader: *const PlyReaderHandle) -> bool {
    reader_ref(reader).map_or(false, PlyReader::valid)
}

// ===== Cursor =====

#[no_mangle]
pub extern "C" fn ply_reader_has_element(reader: *const PlyReaderHandle) -> bool {
    reader_ref(reader).map_or(false, PlyReader::has_element)
}

#[no_mangle]
pub extern "C" fn ply_reader_element_is(reader: *const PlyReaderHandle, name: *const c_char) -> bool {
    if name.is_null() {
        return false;
    }
    // Safety: the caller passes a NUL-terminated string.
    let name = unsafe { CStr::from_ptr(name) };
    match (reader_ref(reader), name.to_str()) {
        (Some(reader), Ok(name)) => reader.element_is(name),
        _ => false,
    }
}

#[no_mangle]
pub extern "C" fn ply_reader_load_element(reader: *mut PlyReaderHandle) -> bool {
    match reader_mut(reader) {
        Some(reader) => report(reader.load_element().map(|_| ())).is_some(),
        None => false,
    }
}

#[no_mangle]
pub extern "C" fn ply_reader_num_rows(reader: *const PlyReaderHandle) -> u32 {
    reader_ref(reader).map_or(0, |r| count_to_c(r.num_rows()))
}

#[no_mangle]
pub extern "C" fn ply_reader_next_element(reader: *mut PlyReaderHandle) {
    if let Some(reader) = reader_mut(reader) {
        reader.next_element();
    }
}

// ===== Property location =====

/// Writes the x/y/z property indices to `prop_idxs` (3 values).
#[no_mangle]
pub extern "C" fn ply_reader_find_pos(reader: *const PlyReaderHandle, prop_idxs: *mut u32) -> bool {
    match loaded(reader).and_then(|el| el.find_pos()) {
        Some(indices) => write_indices(prop_idxs, &indices),
        None => false,
    }
}

/// Writes the nx/ny/nz property indices to `prop_idxs` (3 values).
#[no_mangle]
pub extern "C" fn ply_reader_find_normals(reader: *const PlyReaderHandle, prop_idxs: *mut u32) -> bool {
    match loaded(reader).and_then(|el| el.find_normal()) {
        Some(indices) => write_indices(prop_idxs, &indices),
        None => false,
    }
}

/// Writes the texture coordinate property indices to `prop_idxs` (2 values).
#[no_mangle]
pub extern "C" fn ply_reader_find_texcoord(reader: *const PlyReaderHandle, prop_idxs: *mut u32) -> bool {
    match loaded(reader).and_then(|el| el.find_texcoord()) {
        Some(indices) => write_indices(prop_idxs, &indices),
        None => false,
    }
}

/// Writes the face index list property index to `prop_idxs` (1 value).
#[no_mangle]
pub extern "C" fn ply_reader_find_indices(reader: *const PlyReaderHandle, prop_idxs: *mut u32) -> bool {
    match loaded(reader).and_then(|el| el.find_indices()) {
        Some(index) => write_indices(prop_idxs, &[index]),
        None => false,
    }
}

// ===== Extraction =====

/// Copies `num_props` properties of every row into `dest`, row-major.
///
/// `dest_len` is the capacity of `dest` in values of `dest_type`.
#[no_mangle]
pub extern "C" fn ply_reader_extract_properties(
    reader: *const PlyReaderHandle,
    prop_idxs: *const u32,
    num_props: u32,
    dest_type: c_int,
    dest: *mut c_void,
    dest_len: u32,
) -> bool {
    let Some(el) = loaded(reader) else {
        return false;
    };
    if prop_idxs.is_null() {
        set_last_error("Property index array is null");
        return false;
    }
    // Safety: the caller provides `num_props` indices.
    let indices = unsafe { std::slice::from_raw_parts(prop_idxs, num_props as usize) };
    let result = parse_dest_type(dest_type).and_then(|ty| {
        check_dest(dest)?;
        with_dest_slice!(ty, dest, dest_len as usize, |out| el.extract_properties(indices, out))
    });
    report(result).is_some()
}

#[no_mangle]
pub extern "C" fn ply_reader_sum_of_list_counts(reader: *const PlyReaderHandle, prop_idx: u32) -> u32 {
    loaded(reader)
        .and_then(|el| report(el.sum_of_list_counts(prop_idx)))
        .map_or(0, count_to_c)
}

/// Flattens list property `prop_idx` into `dest` (capacity `dest_len`).
#[no_mangle]
pub extern "C" fn ply_reader_extract_list_property(
    reader: *const PlyReaderHandle,
    prop_idx: u32,
    dest_type: c_int,
    dest: *mut c_void,
    dest_len: u32,
) -> bool {
    let Some(el) = loaded(reader) else {
        return false;
    };
    let result = parse_dest_type(dest_type).and_then(|ty| {
        check_dest(dest)?;
        with_dest_slice!(ty, dest, dest_len as usize, |out| el.extract_list_property(prop_idx, out))
    });
    report(result).is_some()
}

// ===== Triangulation =====

#[no_mangle]
pub extern "C" fn ply_reader_requires_triangulation(reader: *const PlyReaderHandle, prop_idx: u32) -> bool {
    loaded(reader)
        .and_then(|el| report(el.requires_triangulation(prop_idx)))
        .unwrap_or(false)
}

#[no_mangle]
pub extern "C" fn ply_reader_num_triangles(reader: *const PlyReaderHandle, prop_idx: u32) -> u32 {
    loaded(reader)
        .and_then(|el| report(el.num_triangles(prop_idx)))
        .map_or(0, count_to_c)
}

/// Fan-triangulates list property `prop_idx` into `dest` (capacity
/// `dest_len`). `pos` holds `num_verts` xyz float triples.
#[no_mangle]
pub extern "C" fn ply_reader_extract_triangles(
    reader: *const PlyReaderHandle,
    prop_idx: u32,
    pos: *const f32,
    num_verts: u32,
    dest_type: c_int,
    dest: *mut c_void,
    dest_len: u32,
) -> bool {
    let Some(el) = loaded(reader) else {
        return false;
    };
    let positions: &[f32] = if pos.is_null() || num_verts == 0 {
        &[]
    } else {
        // Safety: the caller provides `num_verts` xyz triples.
        unsafe { std::slice::from_raw_parts(pos, num_verts as usize * 3) }
    };
    let result = parse_dest_type(dest_type).and_then(|ty| {
        check_dest(dest)?;
        with_dest_slice!(ty, dest, dest_len as usize, |out| {
            el.extract_triangles(prop_idx, positions, num_verts as usize, out)
        })
    });
    report(result).is_some()
}

// ===== Error Handling =====

/// Gets the last error message recorded on this thread.
///
/// The pointer stays valid until the next failing call or
/// [`ply_reader_clear_error`] on the same thread.
#[no_mangle]
pub extern "C" fn ply_reader_get_last_error() -> *const c_char {
    LAST_ERROR.with(|error| match error.borrow().as_ref() {
        Some(msg) => msg.as_ptr(),
        None => ptr::null(),
    })
}

/// Clears the last error message
#[no_mangle]
pub extern "C" fn ply_reader_clear_error() {
    LAST_ERROR.with(|error| {
        *error.borrow_mut() = None;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const QUAD_MESH: &str = "ply\n\
        format ascii 1.0\n\
        element vertex 4\n\
        property float x\n\
        property float y\n\
        property float z\n\
        property float u\n\
        property float v\n\
        element face 1\n\
        property list uchar int vertex_indices\n\
        end_header\n\
        0 0 0 0 0\n\
        1 0 0 1 0\n\
        1 1 0 1 1\n\
        0 1 0 0 1\n\
        4 0 1 2 3\n";

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn c_path(file: &NamedTempFile) -> CString {
        CString::new(file.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_full_walk() {
        let file = write_temp(QUAD_MESH);
        let path = c_path(&file);
        let reader = ply_reader_create(path.as_ptr());
        assert!(!reader.is_null());
        assert!(ply_reader_valid(reader));

        let vertex = CString::new("vertex").unwrap();
        let face = CString::new("face").unwrap();
        let mut idxs = [0u32; 3];

        assert!(ply_reader_has_element(reader));
        assert!(ply_reader_element_is(reader, vertex.as_ptr()));
        assert!(!ply_reader_find_pos(reader, idxs.as_mut_ptr()));
        assert!(ply_reader_load_element(reader));
        assert_eq!(ply_reader_num_rows(reader), 4);
        assert!(ply_reader_find_pos(reader, idxs.as_mut_ptr()));
        assert_eq!(idxs, [0, 1, 2]);

        let mut pos = [0f32; 12];
        assert!(ply_reader_extract_properties(
            reader,
            idxs.as_ptr(),
            3,
            ScalarType::Float32.tag(),
            pos.as_mut_ptr() as *mut c_void,
            pos.len() as u32,
        ));
        assert_eq!(&pos[3..6], &[1.0, 0.0, 0.0]);

        assert!(!ply_reader_find_normals(reader, idxs.as_mut_ptr()));
        assert!(ply_reader_find_texcoord(reader, idxs.as_mut_ptr()));
        assert_eq!(&idxs[..2], &[3, 4]);

        ply_reader_next_element(reader);
        assert!(ply_reader_element_is(reader, face.as_ptr()));
        assert!(ply_reader_load_element(reader));
        assert!(ply_reader_find_indices(reader, idxs.as_mut_ptr()));
        assert_eq!(idxs[0], 0);
        assert!(ply_reader_requires_triangulation(reader, 0));
        assert_eq!(ply_reader_num_triangles(reader, 0), 2);
        assert_eq!(ply_reader_sum_of_list_counts(reader, 0), 4);

        let mut tris = [0i32; 6];
        assert!(ply_reader_extract_triangles(
            reader,
            0,
            pos.as_ptr(),
            4,
            ScalarType::Int32.tag(),
            tris.as_mut_ptr() as *mut c_void,
            tris.len() as u32,
        ));
        assert_eq!(tris, [0, 1, 2, 0, 2, 3]);

        let mut flat = [0u32; 4];
        assert!(ply_reader_extract_list_property(
            reader,
            0,
            ScalarType::Uint32.tag(),
            flat.as_mut_ptr() as *mut c_void,
            flat.len() as u32,
        ));
        assert_eq!(flat, [0, 1, 2, 3]);

        ply_reader_next_element(reader);
        assert!(!ply_reader_has_element(reader));
        ply_reader_destroy(reader);
    }

    #[test]
    fn test_undersized_and_bad_type() {
        let file = write_temp(QUAD_MESH);
        let path = c_path(&file);
        let reader = ply_reader_create(path.as_ptr());
        assert!(ply_reader_load_element(reader));
        let idxs = [0u32, 1, 2];

        let mut small = [0f32; 11];
        ply_reader_clear_error();
        assert!(!ply_reader_extract_properties(
            reader,
            idxs.as_ptr(),
            3,
            ScalarType::Float32.tag(),
            small.as_mut_ptr() as *mut c_void,
            small.len() as u32,
        ));
        assert!(!ply_reader_get_last_error().is_null());
        assert_eq!(small, [0.0; 11]);

        let mut dest = [0f32; 12];
        assert!(!ply_reader_extract_properties(
            reader,
            idxs.as_ptr(),
            3,
            8,
            dest.as_mut_ptr() as *mut c_void,
            dest.len() as u32,
        ));
        ply_reader_destroy(reader);
    }

    #[test]
    fn test_missing_file_and_bad_header() {
        let missing = CString::new("/nonexistent/dir/missing.ply").unwrap();
        assert!(ply_reader_create(missing.as_ptr()).is_null());
        assert!(!ply_reader_get_last_error().is_null());

        let file = write_temp("ply\nformat ascii 1.0\nproperty float x\nend_header\n");
        let path = c_path(&file);
        let reader = ply_reader_create(path.as_ptr());
        assert!(!reader.is_null());
        assert!(!ply_reader_valid(reader));
        assert!(!ply_reader_has_element(reader));
        assert!(!ply_reader_load_element(reader));
        ply_reader_destroy(reader);
    }

    #[test]
    fn test_null_handles() {
        assert!(ply_reader_create(ptr::null()).is_null());
        assert!(!ply_reader_valid(ptr::null()));
        assert!(!ply_reader_has_element(ptr::null()));
        assert_eq!(ply_reader_num_rows(ptr::null()), 0);
        ply_reader_next_element(ptr::null_mut());
        ply_reader_destroy(ptr::null_mut());

        ply_reader_clear_error();
        assert!(ply_reader_get_last_error().is_null());
    }

    #[test]
    fn test_count_too_large_for_c() {
        let file = write_temp("ply\nformat ascii 1.0\nelement vertex 4294967296\nproperty float x\nend_header\n");
        let path = c_path(&file);
        let reader = ply_reader_create(path.as_ptr());
        assert!(ply_reader_has_element(reader));

        ply_reader_clear_error();
        assert_eq!(ply_reader_num_rows(reader), 0);
        assert!(!ply_reader_get_last_error().is_null());
        ply_reader_destroy(reader);

        assert_eq!(count_to_c(7), 7);
        assert_eq!(count_to_c(u32::MAX as usize), u32::MAX);
    }
}
