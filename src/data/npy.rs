// ============================================================
// Layer 4 — NumPy .npy Reader
// ============================================================
// Parses the NumPy binary array format that the feature
// extraction step writes (np.save).
//
// File layout:
//   \x93NUMPY            6-byte magic
//   major, minor         format version (1.0, 2.0 or 3.0)
//   header_len           u16 LE (v1) or u32 LE (v2, v3)
//   header               Python dict literal, e.g.
//                        {'descr': '<f4', 'fortran_order': False, 'shape': (1000, 4320), }
//   payload              row-major array data
//
// Supported dtypes:
//   floats   <f4 <f8
//   integers i1 i2 i4 i8 u1 u2 u4 u8 (little-endian or byte-order free)
//   strings  <U{n} (UTF-32LE code points), |S{n} (raw bytes)
//
// Object arrays (pickled) and big-endian data are rejected.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::{
    error::DataError,
    features::{element_count, FeatureMatrix},
    labels::LabelSet,
};

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Element type declared by the header's `descr` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    F32,
    F64,
    Int { bytes: usize, signed: bool },
    /// Fixed-width unicode, `n` code points per element.
    Unicode(usize),
    /// Fixed-width byte string, `n` bytes per element.
    Bytes(usize),
}

impl Dtype {
    /// Bytes per element, or None if the declared width overflows.
    fn item_size(&self) -> Option<usize> {
        match *self {
            Dtype::F32               => Some(4),
            Dtype::F64               => Some(8),
            Dtype::Int { bytes, .. } => Some(bytes),
            Dtype::Unicode(n)        => n.checked_mul(4),
            Dtype::Bytes(n)          => Some(n),
        }
    }
}

/// Decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NpyData {
    Float(Vec<f32>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

/// A parsed .npy file.
#[derive(Debug, Clone)]
pub struct NpyArray {
    path:  PathBuf,
    shape: Vec<usize>,
    data:  NpyData,
}

/// Read and parse a .npy file from disk.
pub fn read_npy(path: &Path) -> Result<NpyArray, DataError> {
    let bytes = fs::read(path).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_npy(&bytes, path)
}

/// Parse an in-memory .npy image. `path` is used for error messages only.
pub fn parse_npy(bytes: &[u8], path: &Path) -> Result<NpyArray, DataError> {
    let malformed = |message: &str| DataError::Malformed {
        path:    path.to_path_buf(),
        message: message.to_string(),
    };

    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err(malformed("missing \\x93NUMPY magic"));
    }

    // Version 1.x stores the header length in 2 bytes, later versions in 4.
    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(malformed("truncated header length"));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        v => return Err(malformed(&format!("unsupported format version {v}"))),
    };

    let header_end = header_start + header_len;
    if bytes.len() < header_end {
        return Err(malformed("header runs past end of file"));
    }
    let header = std::str::from_utf8(&bytes[header_start..header_end])
        .map_err(|_| malformed("header is not valid text"))?;

    let header = parse_header(header).map_err(|m| malformed(&m))?;
    if header.fortran_order {
        return Err(malformed("Fortran-ordered arrays are not supported"));
    }
    let dtype = parse_descr(&header.descr).ok_or_else(|| DataError::UnsupportedDtype {
        path:  path.to_path_buf(),
        descr: header.descr.clone(),
    })?;

    let item_size = dtype.item_size().ok_or_else(|| {
        malformed(&format!("element width of {} is too large", header.descr))
    })?;
    let expected = element_count(&header.shape)
        .and_then(|count| count.checked_mul(item_size))
        .ok_or_else(|| malformed(&format!("shape {:?} is too large to address", header.shape)))?;

    let payload = &bytes[header_end..];
    if payload.len() != expected {
        return Err(malformed(&format!(
            "shape {:?} of {} needs {} payload bytes, found {}",
            header.shape, header.descr, expected, payload.len()
        )));
    }

    let data = decode_payload(payload, dtype, item_size).map_err(|m| malformed(&m))?;
    tracing::debug!("Parsed {} ({} {:?})", path.display(), header.descr, header.shape);

    Ok(NpyArray {
        path: path.to_path_buf(),
        shape: header.shape,
        data,
    })
}

impl NpyArray {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &NpyData {
        &self.data
    }

    /// Numeric arrays as an f32 feature matrix. Integers are widened.
    pub fn into_features(self) -> Result<FeatureMatrix, DataError> {
        let values = match self.data {
            NpyData::Float(v) => v,
            NpyData::Int(v)   => v.into_iter().map(|x| x as f32).collect(),
            NpyData::Text(_)  => {
                return Err(DataError::UnsupportedDtype {
                    path:  self.path,
                    descr: "string array where numbers were expected".to_string(),
                });
            }
        };
        // Scalars (shape ()) cannot carry an example axis.
        if self.shape.is_empty() {
            return Err(DataError::ShapeMismatch(format!(
                "{} holds a scalar, expected (N, ...)",
                self.path.display()
            )));
        }
        FeatureMatrix::new(self.shape, values)
    }

    /// A (N,) or (N, 1) array of strings or integers as labels.
    pub fn into_labels(self) -> Result<LabelSet, DataError> {
        let trailing = self.shape.get(1..).and_then(element_count);
        if trailing != Some(1) {
            return Err(DataError::ShapeMismatch(format!(
                "labels in {} have shape {:?}, expected (N,)",
                self.path.display(), self.shape
            )));
        }
        let labels = match self.data {
            NpyData::Text(v)  => v,
            NpyData::Int(v)   => v.into_iter().map(|x| x.to_string()).collect(),
            NpyData::Float(_) => {
                return Err(DataError::UnsupportedDtype {
                    path:  self.path,
                    descr: "float array where labels were expected".to_string(),
                });
            }
        };
        Ok(LabelSet::new(labels))
    }
}

// ─── Header parsing ──────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct Header {
    descr:         String,
    fortran_order: bool,
    shape:         Vec<usize>,
}

fn parse_header(header: &str) -> Result<Header, String> {
    let descr = value_after(header, "descr")
        .and_then(quoted)
        .ok_or_else(|| format!("no 'descr' string in header {header:?}"))?;

    let fortran_order = match value_after(header, "fortran_order") {
        Some(rest) if rest.starts_with("True")  => true,
        Some(rest) if rest.starts_with("False") => false,
        _ => return Err(format!("no 'fortran_order' flag in header {header:?}")),
    };

    let shape_src = value_after(header, "shape")
        .and_then(|rest| {
            let open  = rest.find('(')?;
            let close = rest.find(')')?;
            (open < close).then(|| &rest[open + 1..close])
        })
        .ok_or_else(|| format!("no 'shape' tuple in header {header:?}"))?;

    let shape = shape_src
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            // Old numpy versions write dims as Python longs, e.g. 1000L.
            s.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| format!("bad dimension {s:?} in shape"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Header { descr, fortran_order, shape })
}

/// Text following `'key':` with leading whitespace removed.
fn value_after<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let single = format!("'{key}':");
    let double = format!("\"{key}\":");
    let (pos, len) = header
        .find(&single)
        .map(|p| (p, single.len()))
        .or_else(|| header.find(&double).map(|p| (p, double.len())))?;
    Some(header[pos + len..].trim_start())
}

/// Contents of a leading '...' or "..." literal.
fn quoted(rest: &str) -> Option<String> {
    let quote = rest.chars().next().filter(|&c| c == '\'' || c == '"')?;
    let body  = &rest[1..];
    let end   = body.find(quote)?;
    Some(body[..end].to_string())
}

fn parse_descr(descr: &str) -> Option<Dtype> {
    let rest      = descr.strip_prefix(|c: char| matches!(c, '<' | '|' | '='))?;
    let mut chars = rest.chars();
    let kind      = chars.next()?;
    let size: usize = chars.as_str().parse().ok()?;

    match (kind, size) {
        ('f', 4) => Some(Dtype::F32),
        ('f', 8) => Some(Dtype::F64),
        ('i', 1 | 2 | 4 | 8) => Some(Dtype::Int { bytes: size, signed: true }),
        ('u', 1 | 2 | 4 | 8) => Some(Dtype::Int { bytes: size, signed: false }),
        ('U', n) if n > 0 => Some(Dtype::Unicode(n)),
        ('S', n) if n > 0 => Some(Dtype::Bytes(n)),
        _ => None,
    }
}

// ─── Payload decoding ────────────────────────────────────────────────────────

fn decode_payload(payload: &[u8], dtype: Dtype, item_size: usize) -> Result<NpyData, String> {
    let data = match dtype {
        Dtype::F32 => NpyData::Float(
            payload
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        ),
        Dtype::F64 => NpyData::Float(
            payload
                .chunks_exact(8)
                .map(|b| {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(b);
                    f64::from_le_bytes(raw) as f32
                })
                .collect(),
        ),
        Dtype::Int { bytes, signed } => NpyData::Int(
            payload
                .chunks_exact(bytes)
                .map(|b| decode_int(b, signed))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Dtype::Unicode(_) => NpyData::Text(
            payload
                .chunks_exact(item_size)
                .map(decode_utf32)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Dtype::Bytes(n) => NpyData::Text(
            payload
                .chunks_exact(n)
                .map(|b| {
                    let end = b.iter().rposition(|&c| c != 0).map_or(0, |p| p + 1);
                    String::from_utf8(b[..end].to_vec())
                        .map_err(|_| "byte string is not valid UTF-8".to_string())
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    Ok(data)
}

fn decode_int(b: &[u8], signed: bool) -> Result<i64, String> {
    let mut raw = [0u8; 8];
    raw[..b.len()].copy_from_slice(b);
    // Sign-extend negative values of narrower signed types.
    if signed && b.len() < 8 && b[b.len() - 1] & 0x80 != 0 {
        for byte in raw.iter_mut().skip(b.len()) {
            *byte = 0xFF;
        }
    }
    if signed {
        Ok(i64::from_le_bytes(raw))
    } else {
        i64::try_from(u64::from_le_bytes(raw))
            .map_err(|_| "unsigned value does not fit in i64".to_string())
    }
}

/// One fixed-width UTF-32LE element; trailing NULs are padding.
fn decode_utf32(b: &[u8]) -> Result<String, String> {
    b.chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .take_while(|&cp| cp != 0)
        .map(|cp| char::from_u32(cp).ok_or_else(|| format!("invalid code point {cp:#x}")))
        .collect()
}

// ─── Writers for tests ───────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn parse(bytes: &[u8]) -> Result<NpyArray, DataError> {
        parse_npy(bytes, Path::new("test.npy"))
    }

    #[test]
    fn test_parse_header_fields() {
        let h = parse_header("{'descr': '<f4', 'fortran_order': False, 'shape': (1024, 42), }").unwrap();
        assert_eq!(h.descr, "<f4");
        assert!(!h.fortran_order);
        assert_eq!(h.shape, vec![1024, 42]);

        let h = parse_header("{'descr': '<U7', 'fortran_order': False, 'shape': (100,), }").unwrap();
        assert_eq!(h.shape, vec![100]);
    }

    #[test]
    fn test_reads_f32_matrix() {
        let values: Vec<f32> = (0..6).map(|v| v as f32 - 2.5).collect();
        let array = parse(&f32_bytes(&[2, 3], &values)).unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        let m = array.into_features().unwrap();
        assert_eq!(m.row(1), &values[3..]);
    }

    #[test]
    fn test_reads_f64_as_f32() {
        let payload: Vec<u8> = [1.5f64, -0.25].iter().flat_map(|v| v.to_le_bytes()).collect();
        let array = parse(&npy_bytes("<f8", &[2, 1], &payload)).unwrap();
        assert_eq!(array.data(), &NpyData::Float(vec![1.5, -0.25]));
    }

    #[test]
    fn test_reads_unicode_labels() {
        let array  = parse(&unicode_bytes(&["dog_bark", "siren", "drill"])).unwrap();
        let labels = array.into_labels().unwrap();
        assert_eq!(labels.as_slice(), &["dog_bark", "siren", "drill"]);
    }

    #[test]
    fn test_reads_byte_string_labels() {
        let payload = b"kick\0\0snare\0hat\0\0\0".to_vec();
        let labels  = parse(&npy_bytes("|S6", &[3], &payload)).unwrap().into_labels().unwrap();
        assert_eq!(labels.as_slice(), &["kick", "snare", "hat"]);
    }

    #[test]
    fn test_integer_labels_become_strings() {
        let payload: Vec<u8> = [3i32, -1, 7].iter().flat_map(|v| v.to_le_bytes()).collect();
        let labels = parse(&npy_bytes("<i4", &[3], &payload)).unwrap().into_labels().unwrap();
        assert_eq!(labels.as_slice(), &["3", "-1", "7"]);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let err = parse(b"NOTNUMPYATALL").unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let mut bytes = f32_bytes(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(parse(&bytes), Err(DataError::Malformed { .. })));
    }

    #[test]
    fn test_rejects_object_and_big_endian() {
        assert!(matches!(
            parse(&npy_bytes("|O", &[1], &[0; 8])),
            Err(DataError::UnsupportedDtype { .. })
        ));
        assert!(matches!(
            parse(&npy_bytes(">f4", &[1], &[0; 4])),
            Err(DataError::UnsupportedDtype { .. })
        ));
    }

    #[test]
    fn test_rejects_overflowing_shape() {
        let huge = parse(&npy_bytes("<f4", &[usize::MAX / 2, 4], &[]));
        assert!(matches!(huge, Err(DataError::Malformed { .. })));

        let wrapped = parse(&npy_bytes("<f4", &[1 << 62, 4], &[]));
        assert!(matches!(wrapped, Err(DataError::Malformed { .. })));

        let wide = parse(&npy_bytes(&format!("<U{}", usize::MAX / 2), &[0], &[]));
        assert!(matches!(wide, Err(DataError::Malformed { .. })));
    }

    #[test]
    fn test_rejects_non_ascii_descr() {
        assert!(matches!(
            parse(&npy_bytes("é4", &[1], &[0; 4])),
            Err(DataError::UnsupportedDtype { .. })
        ));
        assert_eq!(parse_descr("<é4"), None);
        assert_eq!(parse_descr(""), None);
    }

    #[test]
    fn test_rejects_fortran_order() {
        let mut bytes = f32_bytes(&[1, 1], &[0.0]);
        let text      = String::from_utf8_lossy(&bytes[10..]).replace("False", "True ");
        bytes.truncate(10);
        bytes.extend_from_slice(text.as_bytes());
        assert!(matches!(parse(&bytes), Err(DataError::Malformed { .. })));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = read_npy(Path::new("/definitely/not/here.npy")).unwrap_err();
        assert!(matches!(err, DataError::Read { .. }));
    }

    #[test]
    fn test_decode_negative_narrow_ints() {
        assert_eq!(decode_int(&[0xFF], true).unwrap(), -1);
        assert_eq!(decode_int(&[0xFF], false).unwrap(), 255);
        assert_eq!(decode_int(&(-300i16).to_le_bytes(), true).unwrap(), -300);
    }
}
