//! Minimal XML-RPC transport.
//!
//! # Responsibilities
//! - Encode a method call with struct/string/int/boolean parameters
//! - POST it to the backend RPC endpoint
//! - Hand the raw response headers to an inspection hook
//! - Classify the reply: success, fault, HTTP protocol error, transport error
//!
//! Only the shape of the reply is examined; successful return values are not decoded.

use axum::http::{header, HeaderMap, StatusCode};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::session::LoginError;

/// An XML-RPC parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i32),
    Boolean(bool),
    Struct(Vec<(String, Value)>),
}

impl Value {
    fn write_xml(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::String(s) => {
                out.push_str("<string>");
                out.push_str(&escape(s.as_str()));
                out.push_str("</string>");
            }
            Value::Int(i) => {
                out.push_str(&format!("<int>{}</int>", i));
            }
            Value::Boolean(b) => {
                out.push_str(if *b { "<boolean>1</boolean>" } else { "<boolean>0</boolean>" });
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    out.push_str("<member><name>");
                    out.push_str(&escape(name.as_str()));
                    out.push_str("</name>");
                    value.write_xml(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
        }
        out.push_str("</value>");
    }
}

/// Encode a `methodCall` document.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.write_xml(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

/// Look for a `<fault>` in a `methodResponse` and extract its code and string.
pub fn parse_fault(body: &str) -> Result<Option<(i32, String)>, LoginError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut in_fault = false;
    let mut seen_response = false;
    let mut element = Vec::new();
    let mut member = String::new();
    let mut code = 0;
    let mut message = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"methodResponse" => seen_response = true,
                    b"fault" => in_fault = true,
                    _ => {}
                }
                element = name;
            }
            Ok(Event::Text(text)) if in_fault => {
                let text = text
                    .unescape()
                    .map_err(|e| LoginError::Malformed(e.to_string()))?
                    .into_owned();
                match element.as_slice() {
                    b"name" => member = text,
                    b"value" | b"string" | b"int" | b"i4" => match member.as_str() {
                        "faultCode" => code = text.trim().parse().unwrap_or(0),
                        "faultString" => message = text,
                        _ => {}
                    },
                    _ => {}
                }
            }
            Ok(Event::End(_)) => element.clear(),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(LoginError::Malformed(e.to_string())),
        }
    }

    if !seen_response {
        return Err(LoginError::Malformed("no methodResponse element".to_string()));
    }

    Ok(in_fault.then_some((code, message)))
}

/// Posts XML-RPC calls to one endpoint.
pub struct XmlRpcTransport<'a> {
    client: &'a reqwest::Client,
    endpoint: String,
}

impl<'a> XmlRpcTransport<'a> {
    pub fn new(client: &'a reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Perform a call. `inspect` sees the raw response headers of every reply,
    /// before its status or body is examined.
    pub async fn call<F>(&self, method: &str, params: &[Value], inspect: F) -> Result<(), LoginError>
    where
        F: FnOnce(&HeaderMap),
    {
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "text/xml")
            .body(encode_call(method, params))
            .send()
            .await
            .map_err(LoginError::Transport)?;

        inspect(response.headers());

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LoginError::Protocol {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response.text().await.map_err(LoginError::Transport)?;
        match parse_fault(&body)? {
            Some((code, message)) => Err(LoginError::Fault { code, message }),
            None => Ok(()),
        }
    }
}
