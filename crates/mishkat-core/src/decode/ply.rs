//! PLY (Stanford polygon) decoding
//!
//! Supports `ascii`, `binary_little_endian` and `binary_big_endian` bodies.
//! Only the `vertex` and `face` elements are interpreted; any other element
//! is read and discarded. Polygons are fan-triangulated.

use thiserror::Error;

use super::DecodeError;
use crate::geometry::{MeshData, ModelScene};
use crate::material::MaterialDesc;

#[derive(Error, Debug, PartialEq)]
pub enum PlyError {
    #[error("missing 'ply' magic")]
    MissingMagic,
    #[error("header is not terminated by end_header")]
    UnterminatedHeader,
    #[error("unsupported body format: {0}")]
    UnsupportedEncoding(String),
    #[error("invalid header line: {0}")]
    InvalidHeader(String),
    #[error("unknown property type: {0}")]
    UnknownType(String),
    #[error("unexpected end of data")]
    UnexpectedEof,
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("vertex element lacks property {0}")]
    MissingProperty(&'static str),
    #[error("face references vertex {index} of {vertex_count}")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Encoding {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl Scalar {
    fn parse(name: &str) -> Result<Self, PlyError> {
        Ok(match name {
            "char" | "int8" => Scalar::I8,
            "uchar" | "uint8" => Scalar::U8,
            "short" | "int16" => Scalar::I16,
            "ushort" | "uint16" => Scalar::U16,
            "int" | "int32" => Scalar::I32,
            "uint" | "uint32" => Scalar::U32,
            "float" | "float32" => Scalar::F32,
            "double" | "float64" => Scalar::F64,
            other => return Err(PlyError::UnknownType(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PropertyKind {
    Scalar(Scalar),
    List { count: Scalar, item: Scalar },
}

#[derive(Debug, Clone)]
struct Property {
    name: String,
    kind: PropertyKind,
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug)]
struct Header {
    encoding: Encoding,
    elements: Vec<Element>,
    body_offset: usize,
}

fn parse_header(bytes: &[u8]) -> Result<Header, PlyError> {
    if !bytes.starts_with(b"ply") {
        return Err(PlyError::MissingMagic);
    }

    let mut encoding = None;
    let mut elements: Vec<Element> = Vec::new();
    let mut offset = 0;

    loop {
        let rest = &bytes[offset..];
        let line_len = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(PlyError::UnterminatedHeader)?;
        let raw = &rest[..line_len];
        offset += line_len + 1;

        let line = std::str::from_utf8(raw)
            .map_err(|_| PlyError::InvalidHeader(String::from_utf8_lossy(raw).into_owned()))?
            .trim();
        let mut words = line.split_whitespace();
        match words.next() {
            Some("ply") | Some("comment") | Some("obj_info") | None => {}
            Some("format") => {
                encoding = Some(match words.next() {
                    Some("ascii") => Encoding::Ascii,
                    Some("binary_little_endian") => Encoding::BinaryLittleEndian,
                    Some("binary_big_endian") => Encoding::BinaryBigEndian,
                    other => {
                        return Err(PlyError::UnsupportedEncoding(
                            other.unwrap_or_default().to_string(),
                        ))
                    }
                });
            }
            Some("element") => {
                let (Some(name), Some(count)) = (words.next(), words.next()) else {
                    return Err(PlyError::InvalidHeader(line.to_string()));
                };
                let count = count
                    .parse()
                    .map_err(|_| PlyError::InvalidHeader(line.to_string()))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| PlyError::InvalidHeader(line.to_string()))?;
                let parts: Vec<&str> = words.collect();
                let property = match parts.as_slice() {
                    ["list", count, item, name] => Property {
                        name: name.to_string(),
                        kind: PropertyKind::List {
                            count: Scalar::parse(count)?,
                            item: Scalar::parse(item)?,
                        },
                    },
                    [ty, name] => Property {
                        name: name.to_string(),
                        kind: PropertyKind::Scalar(Scalar::parse(ty)?),
                    },
                    _ => return Err(PlyError::InvalidHeader(line.to_string())),
                };
                element.properties.push(property);
            }
            Some("end_header") => break,
            Some(_) => return Err(PlyError::InvalidHeader(line.to_string())),
        }
    }

    Ok(Header {
        encoding: encoding.ok_or_else(|| PlyError::InvalidHeader("missing format line".into()))?,
        elements,
        body_offset: offset,
    })
}

/// Sequential reader over a PLY body
trait ValueSource {
    fn read(&mut self, ty: Scalar) -> Result<f64, PlyError>;
}

struct AsciiSource<'a> {
    tokens: std::str::SplitAsciiWhitespace<'a>,
}

impl ValueSource for AsciiSource<'_> {
    fn read(&mut self, _ty: Scalar) -> Result<f64, PlyError> {
        let token = self.tokens.next().ok_or(PlyError::UnexpectedEof)?;
        token
            .parse()
            .map_err(|_| PlyError::InvalidValue(token.to_string()))
    }
}

struct BinarySource<'a> {
    bytes: &'a [u8],
    pos: usize,
    big_endian: bool,
}

impl BinarySource<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], PlyError> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or(PlyError::UnexpectedEof)?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        if self.big_endian {
            out.reverse();
        }
        Ok(out)
    }
}

impl ValueSource for BinarySource<'_> {
    fn read(&mut self, ty: Scalar) -> Result<f64, PlyError> {
        Ok(match ty {
            Scalar::I8 => i8::from_le_bytes(self.take()?) as f64,
            Scalar::U8 => u8::from_le_bytes(self.take()?) as f64,
            Scalar::I16 => i16::from_le_bytes(self.take()?) as f64,
            Scalar::U16 => u16::from_le_bytes(self.take()?) as f64,
            Scalar::I32 => i32::from_le_bytes(self.take()?) as f64,
            Scalar::U32 => u32::from_le_bytes(self.take()?) as f64,
            Scalar::F32 => f32::from_le_bytes(self.take()?) as f64,
            Scalar::F64 => f64::from_le_bytes(self.take()?),
        })
    }
}

#[derive(Default)]
struct Body {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

fn read_body(header: &Header, source: &mut dyn ValueSource, capacity_hint: usize) -> Result<Body, PlyError> {
    let mut body = Body::default();

    for element in &header.elements {
        match element.name.as_str() {
            "vertex" => read_vertices(element, source, capacity_hint, &mut body)?,
            "face" => read_faces(element, source, &mut body)?,
            _ => {
                for _ in 0..element.count {
                    for property in &element.properties {
                        skip_property(&property.kind, source)?;
                    }
                }
            }
        }
    }

    let vertex_count = body.positions.len();
    if let Some(&index) = body.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(PlyError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }
    Ok(body)
}

fn read_vertices(
    element: &Element,
    source: &mut dyn ValueSource,
    capacity_hint: usize,
    body: &mut Body,
) -> Result<(), PlyError> {
    let slot = |name: &str| element.properties.iter().position(|p| p.name == name);
    let x = slot("x").ok_or(PlyError::MissingProperty("x"))?;
    let y = slot("y").ok_or(PlyError::MissingProperty("y"))?;
    let z = slot("z").ok_or(PlyError::MissingProperty("z"))?;
    let normal_slots = match (slot("nx"), slot("ny"), slot("nz")) {
        (Some(nx), Some(ny), Some(nz)) => Some([nx, ny, nz]),
        _ => None,
    };

    let capacity = element.count.min(capacity_hint);
    body.positions.reserve(capacity);
    if normal_slots.is_some() {
        body.normals.reserve(capacity);
    }

    let mut values = vec![0.0f64; element.properties.len()];
    for _ in 0..element.count {
        for (value, property) in values.iter_mut().zip(&element.properties) {
            *value = match &property.kind {
                PropertyKind::Scalar(ty) => source.read(*ty)?,
                list => {
                    skip_property(list, source)?;
                    0.0
                }
            };
        }
        body.positions
            .push([values[x] as f32, values[y] as f32, values[z] as f32]);
        if let Some([nx, ny, nz]) = normal_slots {
            body.normals
                .push([values[nx] as f32, values[ny] as f32, values[nz] as f32]);
        }
    }
    Ok(())
}

fn read_faces(element: &Element, source: &mut dyn ValueSource, body: &mut Body) -> Result<(), PlyError> {
    let index_slot = element
        .properties
        .iter()
        .position(|p| p.name == "vertex_indices" || p.name == "vertex_index");

    let mut polygon: Vec<u32> = Vec::with_capacity(4);
    for _ in 0..element.count {
        for (slot, property) in element.properties.iter().enumerate() {
            match (&property.kind, Some(slot) == index_slot) {
                (PropertyKind::List { count, item }, true) => {
                    polygon.clear();
                    let n = source.read(*count)? as usize;
                    for _ in 0..n {
                        let index = source.read(*item)?;
                        if index < 0.0 {
                            return Err(PlyError::InvalidValue(index.to_string()));
                        }
                        polygon.push(index as u32);
                    }
                    for i in 1..polygon.len().saturating_sub(1) {
                        body.indices
                            .extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
                    }
                }
                (kind, _) => skip_property(kind, source)?,
            }
        }
    }
    Ok(())
}

fn skip_property(kind: &PropertyKind, source: &mut dyn ValueSource) -> Result<(), PlyError> {
    match kind {
        PropertyKind::Scalar(ty) => {
            source.read(*ty)?;
        }
        PropertyKind::List { count, item } => {
            let n = source.read(*count)? as usize;
            for _ in 0..n {
                source.read(*item)?;
            }
        }
    }
    Ok(())
}

/// Decode a PLY mesh into a single gold mesh
///
/// Files without faces (point clouds) have nothing to shade and are
/// rejected as empty.
pub fn decode(bytes: &[u8]) -> Result<ModelScene, DecodeError> {
    let header = parse_header(bytes)?;
    let data = &bytes[header.body_offset..];

    let body = match header.encoding {
        Encoding::Ascii => {
            let text = std::str::from_utf8(data)
                .map_err(|e| PlyError::InvalidValue(e.to_string()))?;
            let mut source = AsciiSource {
                tokens: text.split_ascii_whitespace(),
            };
            read_body(&header, &mut source, data.len())?
        }
        Encoding::BinaryLittleEndian | Encoding::BinaryBigEndian => {
            let mut source = BinarySource {
                bytes: data,
                pos: 0,
                big_endian: header.encoding == Encoding::BinaryBigEndian,
            };
            read_body(&header, &mut source, data.len())?
        }
    };

    if body.indices.is_empty() {
        return Err(DecodeError::Empty);
    }

    Ok(ModelScene::single(
        MeshData::with_normals(body.positions, body.normals, body.indices),
        MaterialDesc::gold(),
    ))
}
