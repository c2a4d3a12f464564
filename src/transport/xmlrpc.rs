//! XML-RPC wire codec.
//!
//! Encodes a method call with JSON-modelled arguments into `<methodCall>`
//! XML and decodes `<methodResponse>` XML back into `serde_json::Value`.
//! The JSON value model maps onto XML-RPC types: string→`string`,
//! integer→`int`, f64→`double`, bool→`boolean`, array→`array`,
//! object→`struct`, null→`nil`. `dateTime.iso8601` and `base64` payloads
//! are surfaced as strings.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use crate::error::TransportError;

/// Decoded `<methodResponse>`: either a result value or a remote fault.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResponse {
    Success(Value),
    Fault { code: i32, message: String },
}

fn wxml<E: std::fmt::Display>(err: E) -> TransportError {
    TransportError::Xml(err.to_string())
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `<methodCall>` document with a single parameter.
///
/// The Wikidot API takes exactly one struct argument per method, so `args`
/// is written as the sole `<param>`.
pub fn encode_method_call(method: &str, args: &Value) -> Result<String, TransportError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(wxml)?;

    write_start(&mut writer, "methodCall")?;
    write_tagged_text(&mut writer, "methodName", method)?;
    write_start(&mut writer, "params")?;
    write_start(&mut writer, "param")?;
    write_value(&mut writer, args)?;
    write_end(&mut writer, "param")?;
    write_end(&mut writer, "params")?;
    write_end(&mut writer, "methodCall")?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(wxml)
}

fn write_start<W: Write>(writer: &mut Writer<W>, tag: &str) -> Result<(), TransportError> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(wxml)
}

fn write_end<W: Write>(writer: &mut Writer<W>, tag: &str) -> Result<(), TransportError> {
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(wxml)
}

fn write_tagged_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), TransportError> {
    write_start(writer, tag)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(wxml)?;
    write_end(writer, tag)
}

fn write_value<W: Write>(writer: &mut Writer<W>, value: &Value) -> Result<(), TransportError> {
    write_start(writer, "value")?;

    match value {
        Value::Null => {
            writer
                .write_event(Event::Empty(BytesStart::new("nil")))
                .map_err(wxml)?;
        }
        Value::Bool(b) => {
            write_tagged_text(writer, "boolean", if *b { "1" } else { "0" })?;
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                write_tagged_text(writer, "int", &i.to_string())?;
            } else {
                // Out-of-range u64 or fractional; XML-RPC has no wider int.
                write_tagged_text(writer, "double", &n.to_string())?;
            }
        }
        Value::String(s) => {
            write_tagged_text(writer, "string", s)?;
        }
        Value::Array(items) => {
            write_start(writer, "array")?;
            write_start(writer, "data")?;
            for item in items {
                write_value(writer, item)?;
            }
            write_end(writer, "data")?;
            write_end(writer, "array")?;
        }
        Value::Object(map) => {
            write_start(writer, "struct")?;
            for (name, member) in map {
                write_start(writer, "member")?;
                write_tagged_text(writer, "name", name)?;
                write_value(writer, member)?;
                write_end(writer, "member")?;
            }
            write_end(writer, "struct")?;
        }
    }

    write_end(writer, "value")
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a `<methodResponse>` document.
pub fn decode_method_response(xml: &str) -> Result<RpcResponse, TransportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_fault = false;
    loop {
        match reader.read_event().map_err(wxml)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"methodResponse" | b"params" | b"param" => {}
                b"fault" => in_fault = true,
                b"value" => {
                    let value = parse_value(&mut reader)?;
                    return if in_fault {
                        fault_from_value(&value)
                    } else {
                        Ok(RpcResponse::Success(value))
                    };
                }
                other => {
                    return Err(TransportError::Xml(format!(
                        "unexpected element <{}>",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Eof => {
                return Err(TransportError::Xml("no value in methodResponse".to_string()));
            }
            _ => {}
        }
    }
}

/// Parse one `<value>`; the opening tag has already been consumed and the
/// matching `</value>` is consumed before returning.
fn parse_value(reader: &mut Reader<&[u8]>) -> Result<Value, TransportError> {
    let mut typed: Option<Value> = None;
    let mut bare = String::new();

    loop {
        match reader.read_event().map_err(wxml)? {
            Event::Start(ref e) => {
                let tag = e.name().as_ref().to_vec();
                typed = Some(match tag.as_slice() {
                    b"array" => parse_array(reader)?,
                    b"struct" => parse_struct(reader)?,
                    _ => {
                        let text = read_scalar_text(reader, &tag)?;
                        scalar_value(&tag, &text)?
                    }
                });
            }
            Event::Empty(ref e) => {
                typed = Some(match e.name().as_ref() {
                    b"nil" => Value::Null,
                    // An empty scalar element, e.g. <string/>.
                    _ => Value::String(String::new()),
                });
            }
            Event::Text(t) => {
                bare.push_str(&t.unescape().map_err(wxml)?);
            }
            Event::End(ref e) if e.name().as_ref() == b"value" => {
                // A <value> with no type element holds a bare string.
                return Ok(typed.unwrap_or(Value::String(bare)));
            }
            Event::Eof => {
                return Err(TransportError::Xml("unterminated <value>".to_string()));
            }
            _ => {}
        }
    }
}

/// Collect text content up to the closing tag of `tag`.
fn read_scalar_text(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<String, TransportError> {
    let mut text = String::new();
    loop {
        match reader.read_event().map_err(wxml)? {
            Event::Text(t) => text.push_str(&t.unescape().map_err(wxml)?),
            Event::CData(c) => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(ref e) if e.name().as_ref() == tag => return Ok(text),
            Event::Eof => {
                return Err(TransportError::Xml(format!(
                    "unterminated <{}>",
                    String::from_utf8_lossy(tag)
                )));
            }
            _ => {}
        }
    }
}

fn scalar_value(tag: &[u8], text: &str) -> Result<Value, TransportError> {
    match tag {
        b"i4" | b"i8" | b"int" => {
            let n: i64 = text
                .trim()
                .parse()
                .map_err(|_| TransportError::Xml(format!("bad integer {text:?}")))?;
            Ok(Value::from(n))
        }
        b"boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(TransportError::Xml(format!("bad boolean {other:?}"))),
        },
        b"double" => {
            let n: f64 = text
                .trim()
                .parse()
                .map_err(|_| TransportError::Xml(format!("bad double {text:?}")))?;
            Ok(serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        b"string" | b"dateTime.iso8601" | b"base64" => Ok(Value::String(text.to_string())),
        b"nil" => Ok(Value::Null),
        other => Err(TransportError::Xml(format!(
            "unknown value type <{}>",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Parse `<array>` after its opening tag; consumes through `</array>`.
fn parse_array(reader: &mut Reader<&[u8]>) -> Result<Value, TransportError> {
    let mut items = Vec::new();
    loop {
        match reader.read_event().map_err(wxml)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"data" => {}
                b"value" => items.push(parse_value(reader)?),
                other => {
                    return Err(TransportError::Xml(format!(
                        "unexpected <{}> in array",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::End(ref e) if e.name().as_ref() == b"array" => return Ok(Value::Array(items)),
            Event::Eof => return Err(TransportError::Xml("unterminated <array>".to_string())),
            _ => {}
        }
    }
}

/// Parse `<struct>` after its opening tag; consumes through `</struct>`.
fn parse_struct(reader: &mut Reader<&[u8]>) -> Result<Value, TransportError> {
    let mut map = Map::new();
    let mut name: Option<String> = None;

    loop {
        match reader.read_event().map_err(wxml)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"member" => name = None,
                b"name" => {
                    name = Some(read_scalar_text(reader, b"name")?);
                }
                b"value" => {
                    let member_name = name
                        .take()
                        .ok_or_else(|| TransportError::Xml("member value before name".to_string()))?;
                    map.insert(member_name, parse_value(reader)?);
                }
                other => {
                    return Err(TransportError::Xml(format!(
                        "unexpected <{}> in struct",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::End(ref e) if e.name().as_ref() == b"struct" => return Ok(Value::Object(map)),
            Event::Eof => return Err(TransportError::Xml("unterminated <struct>".to_string())),
            _ => {}
        }
    }
}

fn fault_from_value(value: &Value) -> Result<RpcResponse, TransportError> {
    let code = value
        .get("faultCode")
        .and_then(Value::as_i64)
        .or_else(|| {
            value
                .get("faultCode")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
        })
        .unwrap_or(0) as i32;
    let message = match value.get("faultString") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unknown fault".to_string(),
    };
    Ok(RpcResponse::Fault { code, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_method_call_shape() {
        let xml = encode_method_call(
            "pages.get_one",
            &json!({"site": "scp-ru", "page": "scp-173"}),
        )
        .unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<methodName>pages.get_one</methodName>"));
        assert!(xml.contains("<name>site</name>"));
        assert!(xml.contains("<string>scp-ru</string>"));
        assert!(xml.contains("<name>page</name>"));
        assert!(xml.contains("<string>scp-173</string>"));
    }

    #[test]
    fn test_encode_escapes_markup() {
        let xml = encode_method_call("posts.get", &json!({"title": "<b> & co"})).unwrap();
        assert!(xml.contains("&lt;b&gt; &amp; co"));
        assert!(!xml.contains("<b> & co"));
    }

    #[test]
    fn test_encode_scalar_types() {
        let xml = encode_method_call(
            "t",
            &json!({"n": 42, "f": 1.5, "b": true, "none": null, "ids": ["1", "2"]}),
        )
        .unwrap();
        assert!(xml.contains("<int>42</int>"));
        assert!(xml.contains("<double>1.5</double>"));
        assert!(xml.contains("<boolean>1</boolean>"));
        assert!(xml.contains("<nil/>"));
        assert!(xml.contains("<array><data><value><string>1</string></value>"));
    }

    #[test]
    fn test_decode_struct_response() {
        let xml = r#"<?xml version="1.0"?>
            <methodResponse><params><param><value><struct>
              <member><name>fullname</name><value><string>scp-173</string></value></member>
              <member><name>rating</name><value><i4>1437</i4></value></member>
              <member><name>tags</name><value><array><data>
                <value><string>euclid</string></value>
                <value><string>scp</string></value>
              </data></array></value></member>
            </struct></value></param></params></methodResponse>"#;

        let decoded = decode_method_response(xml).unwrap();
        assert_eq!(
            decoded,
            RpcResponse::Success(json!({
                "fullname": "scp-173",
                "rating": 1437,
                "tags": ["euclid", "scp"],
            }))
        );
    }

    #[test]
    fn test_decode_bare_text_value() {
        let xml = "<methodResponse><params><param><value>plain</value></param></params></methodResponse>";
        assert_eq!(
            decode_method_response(xml).unwrap(),
            RpcResponse::Success(Value::String("plain".to_string()))
        );
    }

    #[test]
    fn test_decode_empty_string_value() {
        let xml = "<methodResponse><params><param><value><string/></value></param></params></methodResponse>";
        assert_eq!(
            decode_method_response(xml).unwrap(),
            RpcResponse::Success(Value::String(String::new()))
        );
    }

    #[test]
    fn test_decode_fault() {
        let xml = r#"<methodResponse><fault><value><struct>
            <member><name>faultCode</name><value><int>406</int></value></member>
            <member><name>faultString</name><value><string>no_page</string></value></member>
        </struct></value></fault></methodResponse>"#;

        assert_eq!(
            decode_method_response(xml).unwrap(),
            RpcResponse::Fault {
                code: 406,
                message: "no_page".to_string()
            }
        );
    }

    #[test]
    fn test_decode_datetime_as_string() {
        let xml = "<methodResponse><params><param><value><dateTime.iso8601>2010-06-27T17:04:00</dateTime.iso8601></value></param></params></methodResponse>";
        assert_eq!(
            decode_method_response(xml).unwrap(),
            RpcResponse::Success(Value::String("2010-06-27T17:04:00".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_method_response("<html>nope</html>").is_err());
        assert!(decode_method_response("").is_err());
    }
}
