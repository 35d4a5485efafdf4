use std::io::{Read, Write};

use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use rmpv::Value;

use crate::{
    errors::{FSResult, FedstackError},
    examples::{Examples, Feature},
};

/// Msgpack extension code of a numeric numpy array.
///
/// Payload: msgpack `(shape, dtype_name, little_endian_buffer)`.
pub const NDARRAY_EXT: i8 = 1;

/// Msgpack extension code of a numpy array of `bytes` objects.
///
/// Payload: msgpack `(shape, [bytes, ...])`.
pub const BYTES_NDARRAY_EXT: i8 = 4;

/// Encodings of a client's [`Examples`] in the `data` column of a federated
/// `SQLite` file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum BlobFormat {
    /// JSON of [`Examples`]; bytes columns are base64 strings.
    #[default]
    #[strum(serialize = "json")]
    Json,

    /// zlib-compressed msgpack map of feature name to numpy array,
    /// as published with the fedjax datasets.
    #[strum(serialize = "msgpack_zlib")]
    MsgpackZlib,
}

impl BlobFormat {
    /// Guess the format of a blob from its leading bytes.
    ///
    /// A valid zlib header selects [`BlobFormat::MsgpackZlib`]; anything else
    /// is treated as JSON.
    pub fn detect(blob: &[u8]) -> Self {
        match blob {
            [cmf, flg, ..] if cmf & 0x0f == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0 => {
                BlobFormat::MsgpackZlib
            }
            _ => BlobFormat::Json,
        }
    }

    /// Encode a record.
    pub fn encode(
        &self,
        examples: &Examples,
    ) -> FSResult<Vec<u8>> {
        match self {
            BlobFormat::Json => Ok(serde_json::to_vec(examples)?),
            BlobFormat::MsgpackZlib => encode_msgpack_zlib(examples),
        }
    }

    /// Decode a record.
    pub fn decode(
        &self,
        blob: &[u8],
    ) -> FSResult<Examples> {
        match self {
            BlobFormat::Json => Ok(serde_json::from_slice(blob)?),
            BlobFormat::MsgpackZlib => decode_msgpack_zlib(blob),
        }
    }
}

/// Decode a record in whichever format [`BlobFormat::detect`] reports.
pub fn decode_examples(blob: &[u8]) -> FSResult<Examples> {
    BlobFormat::detect(blob).decode(blob)
}

fn codec_error(msg: impl Into<String>) -> FedstackError {
    FedstackError::Codec(msg.into())
}

fn decode_msgpack_zlib(blob: &[u8]) -> FSResult<Examples> {
    let mut packed = Vec::new();
    ZlibDecoder::new(blob).read_to_end(&mut packed)?;

    let record = rmpv::decode::read_value(&mut packed.as_slice())
        .map_err(|e| codec_error(format!("msgpack: {e}")))?;
    let Value::Map(entries) = record else {
        return Err(codec_error("record is not a msgpack map"));
    };

    entries
        .into_iter()
        .map(|(key, value)| {
            let name = value_string(&key).ok_or_else(|| codec_error("feature name is not a string"))?;
            let feature = decode_feature(&name, &value)?;
            Ok((name, feature))
        })
        .collect()
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => s.as_str().map(str::to_string),
        Value::Binary(b) => String::from_utf8(b.clone()).ok(),
        _ => None,
    }
}

fn value_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Binary(b) => Some(b.clone()),
        Value::String(s) => Some(s.as_bytes().to_vec()),
        _ => None,
    }
}

fn decode_shape(
    name: &str,
    value: &Value,
) -> FSResult<Vec<usize>> {
    let Value::Array(dims) = value else {
        return Err(codec_error(format!("feature {name:?}: shape is not an array")));
    };
    dims.iter()
        .map(|d| {
            d.as_u64()
                .map(|d| d as usize)
                .ok_or_else(|| codec_error(format!("feature {name:?}: bad shape dim {d}")))
        })
        .collect()
}

fn decode_feature(
    name: &str,
    value: &Value,
) -> FSResult<Feature> {
    let Value::Ext(_, payload) = value else {
        return Err(codec_error(format!("feature {name:?} is not a numpy array")));
    };
    let array = rmpv::decode::read_value(&mut payload.as_slice())
        .map_err(|e| codec_error(format!("feature {name:?}: msgpack: {e}")))?;
    let Value::Array(fields) = array else {
        return Err(codec_error(format!("feature {name:?}: array header is not a tuple")));
    };

    match fields.as_slice() {
        // (shape, [len, ...], concatenated bytes)
        [shape, Value::Array(lengths), Value::Binary(buffer)] => {
            let shape = decode_shape(name, shape)?;
            split_lengths(name, &shape, lengths, buffer)
        }
        // (shape, dtype_name, buffer)
        [shape, dtype, Value::Binary(buffer)] => {
            let shape = decode_shape(name, shape)?;
            let dtype = value_string(dtype)
                .ok_or_else(|| codec_error(format!("feature {name:?}: dtype is not a string")))?;
            numeric_feature(name, &shape, &dtype, buffer)
        }
        // (shape, [bytes, ...])
        [shape, Value::Array(items)] => {
            let shape = decode_shape(name, shape)?;
            let rows = items
                .iter()
                .map(|item| {
                    value_bytes(item)
                        .ok_or_else(|| codec_error(format!("feature {name:?}: item is not bytes")))
                })
                .collect::<FSResult<Vec<_>>>()?;
            check_vector(name, &shape, rows.len())?;
            Ok(Feature::Bytes(rows))
        }
        _ => Err(codec_error(format!("feature {name:?}: unknown array layout"))),
    }
}

fn check_vector(
    name: &str,
    shape: &[usize],
    count: usize,
) -> FSResult<()> {
    match shape {
        [n] if *n == count => Ok(()),
        _ => Err(codec_error(format!(
            "feature {name:?}: shape {shape:?} does not hold {count} values"
        ))),
    }
}

fn split_lengths(
    name: &str,
    shape: &[usize],
    lengths: &[Value],
    buffer: &[u8],
) -> FSResult<Feature> {
    check_vector(name, shape, lengths.len())?;
    let mut rows = Vec::with_capacity(lengths.len());
    let mut offset = 0usize;
    for len in lengths {
        let len = len
            .as_u64()
            .ok_or_else(|| codec_error(format!("feature {name:?}: bad item length")))? as usize;
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= buffer.len())
            .ok_or_else(|| codec_error(format!("feature {name:?}: buffer too short")))?;
        rows.push(buffer[offset..end].to_vec());
        offset = end;
    }
    Ok(Feature::Bytes(rows))
}

fn numeric_feature(
    name: &str,
    shape: &[usize],
    dtype: &str,
    buffer: &[u8],
) -> FSResult<Feature> {
    let count: usize = shape.iter().product();

    // Fixed width numpy bytes, e.g. `bytes64` for `S8`; NUL padded.
    if let Some(bits) = dtype.strip_prefix("bytes") {
        let width = bits
            .parse::<usize>()
            .map_err(|_| codec_error(format!("feature {name:?}: bad dtype {dtype:?}")))?
            / 8;
        check_vector(name, shape, count)?;
        if buffer.len() != count * width {
            return Err(codec_error(format!("feature {name:?}: buffer size mismatch")));
        }
        let rows = (0..count)
            .map(|i| {
                let item = &buffer[i * width..(i + 1) * width];
                let end = item.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
                item[..end].to_vec()
            })
            .collect();
        return Ok(Feature::Bytes(rows));
    }

    let width = match dtype {
        "int32" => 4,
        "int64" => 8,
        _ => {
            return Err(codec_error(format!(
                "feature {name:?}: unsupported dtype {dtype:?}"
            )));
        }
    };
    if buffer.len() != count * width {
        return Err(codec_error(format!("feature {name:?}: buffer size mismatch")));
    }

    match (dtype, shape) {
        ("int32", [_]) => Ok(Feature::Int32(read_i32(buffer))),
        ("int32", [rows, cols]) => Ok(Feature::Int32Matrix {
            rows: *rows,
            cols: *cols,
            values: read_i32(buffer),
        }),
        ("int64", [_]) => Ok(Feature::Int64(
            buffer
                .chunks_exact(8)
                .map(|c| {
                    let mut b = [0u8; 8];
                    b.copy_from_slice(c);
                    i64::from_le_bytes(b)
                })
                .collect(),
        )),
        _ => Err(codec_error(format!(
            "feature {name:?}: unsupported {dtype} shape {shape:?}"
        ))),
    }
}

fn read_i32(buffer: &[u8]) -> Vec<i32> {
    buffer
        .chunks_exact(4)
        .map(|c| {
            let mut b = [0u8; 4];
            b.copy_from_slice(c);
            i32::from_le_bytes(b)
        })
        .collect()
}

fn encode_msgpack_zlib(examples: &Examples) -> FSResult<Vec<u8>> {
    let entries = examples
        .iter()
        .map(|(name, feature)| Ok((Value::from(name.as_str()), encode_feature(feature)?)))
        .collect::<FSResult<Vec<_>>>()?;

    let packed = pack(&Value::Map(entries))?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&packed)?;
    Ok(encoder.finish()?)
}

fn pack(value: &Value) -> FSResult<Vec<u8>> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, value).map_err(|e| codec_error(format!("msgpack: {e}")))?;
    Ok(buf)
}

fn shape_value(dims: &[usize]) -> Value {
    Value::Array(dims.iter().map(|&d| Value::from(d as u64)).collect())
}

fn encode_feature(feature: &Feature) -> FSResult<Value> {
    let (code, fields) = match feature {
        Feature::Bytes(rows) => (
            BYTES_NDARRAY_EXT,
            vec![
                shape_value(&[rows.len()]),
                Value::Array(rows.iter().map(|r| Value::Binary(r.clone())).collect()),
            ],
        ),
        Feature::Int32(values) => (
            NDARRAY_EXT,
            vec![
                shape_value(&[values.len()]),
                Value::from("int32"),
                Value::Binary(values.iter().flat_map(|v| v.to_le_bytes()).collect()),
            ],
        ),
        Feature::Int64(values) => (
            NDARRAY_EXT,
            vec![
                shape_value(&[values.len()]),
                Value::from("int64"),
                Value::Binary(values.iter().flat_map(|v| v.to_le_bytes()).collect()),
            ],
        ),
        Feature::Int32Matrix { rows, cols, values } => (
            NDARRAY_EXT,
            vec![
                shape_value(&[*rows, *cols]),
                Value::from("int32"),
                Value::Binary(values.iter().flat_map(|v| v.to_le_bytes()).collect()),
            ],
        ),
    };
    Ok(Value::Ext(code, pack(&Value::Array(fields))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Examples {
        Examples::new()
            .with_feature("tokens", Feature::bytes_from(["a b", ""]))
            .with_feature("score", Feature::Int64(vec![-3, 1 << 40]))
            .with_feature("domain_id", Feature::Int32(vec![0, 1]))
            .with_feature(
                "x",
                Feature::Int32Matrix {
                    rows: 2,
                    cols: 2,
                    values: vec![1, 2, 3, 4],
                },
            )
    }

    fn zlib(packed: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(packed).unwrap();
        encoder.finish().unwrap()
    }

    fn ndarray(
        shape: &[usize],
        dtype: &str,
        buffer: Vec<u8>,
    ) -> Value {
        let payload = pack(&Value::Array(vec![
            shape_value(shape),
            Value::from(dtype),
            Value::Binary(buffer),
        ]))
        .unwrap();
        Value::Ext(NDARRAY_EXT, payload)
    }

    #[test]
    fn test_detect() {
        let examples = record();
        let json = BlobFormat::Json.encode(&examples).unwrap();
        let packed = BlobFormat::MsgpackZlib.encode(&examples).unwrap();

        assert_eq!(BlobFormat::detect(&json), BlobFormat::Json);
        assert_eq!(BlobFormat::detect(&packed), BlobFormat::MsgpackZlib);
        assert_eq!(BlobFormat::detect(b""), BlobFormat::Json);

        assert_eq!(decode_examples(&json).unwrap(), examples);
        assert_eq!(decode_examples(&packed).unwrap(), examples);
    }

    #[test]
    fn test_decode_numpy_layouts() {
        // Fixed width `S5` bytes, int32 and int64 vectors, as numpy writes them.
        let record = Value::Map(vec![
            (
                Value::from("type"),
                ndarray(&[2], "bytes40", [b"quest".as_slice(), b"ans\0\0"].concat()),
            ),
            (
                Value::from("score"),
                ndarray(&[2], "int64", [7i64, -1].iter().flat_map(|v| v.to_le_bytes()).collect()),
            ),
            (
                Value::Binary(b"ids".to_vec()),
                ndarray(&[1, 2], "int32", [5i32, 6].iter().flat_map(|v| v.to_le_bytes()).collect()),
            ),
            (
                Value::from("tokens"),
                Value::Ext(
                    BYTES_NDARRAY_EXT,
                    pack(&Value::Array(vec![
                        shape_value(&[2]),
                        Value::Array(vec![2u64.into(), 3u64.into()]),
                        Value::Binary(b"hiyou".to_vec()),
                    ]))
                    .unwrap(),
                ),
            ),
        ]);
        let blob = zlib(&pack(&record).unwrap());

        let examples = decode_examples(&blob).unwrap();
        assert_eq!(examples.bytes("type").unwrap(), &[b"quest".to_vec(), b"ans".to_vec()]);
        assert_eq!(examples.get("score"), Some(&Feature::Int64(vec![7, -1])));
        assert_eq!(examples.get("ids").and_then(|f| f.row(0)), Some([5, 6].as_slice()));
        assert_eq!(examples.bytes("tokens").unwrap(), &[b"hi".to_vec(), b"you".to_vec()]);
    }

    #[test]
    fn test_decode_errors() {
        let bad_dtype = Value::Map(vec![(
            Value::from("f"),
            ndarray(&[1], "float32", vec![0; 4]),
        )]);
        assert!(matches!(
            decode_examples(&zlib(&pack(&bad_dtype).unwrap())),
            Err(FedstackError::Codec(_))
        ));

        let short = Value::Map(vec![(Value::from("f"), ndarray(&[2], "int32", vec![0; 4]))]);
        assert!(matches!(
            decode_examples(&zlib(&pack(&short).unwrap())),
            Err(FedstackError::Codec(_))
        ));

        let not_a_map = zlib(&pack(&Value::from(3u64)).unwrap());
        assert!(matches!(
            decode_examples(&not_a_map),
            Err(FedstackError::Codec(_))
        ));
    }
}
