//! Line-delimited JSON protocol between a host and a keyword library.
//!
//! Each request line names a keyword and its arguments; each response line
//! carries the outcome plus the log output produced while running it.

use crate::library::KeywordLibrary;
use autokw_core::{AutomationEngine, KeywordError, SharedBuffer, Value};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use tracing::{debug, warn};

/// A keyword invocation sent by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub keyword: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    /// Keyword arguments, in the order the host wrote them.
    #[serde(default)]
    pub kwargs: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(rename = "return", default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Log lines emitted while the keyword ran.
    #[serde(default)]
    pub output: String,
}

impl Response {
    pub fn pass(value: Value) -> Self {
        Self {
            status: Status::Pass,
            value,
            error: None,
            output: String::new(),
        }
    }

    pub fn fail(error: impl ToString) -> Self {
        Self {
            status: Status::Fail,
            value: Value::Null,
            error: Some(error.to_string()),
            output: String::new(),
        }
    }
}

/// Run one request against `library`.
pub fn handle_request<E: AutomationEngine>(
    library: &mut KeywordLibrary<E>,
    request: Request,
) -> Response {
    let args: Vec<Value> = request.args.into_iter().map(Value::from).collect();
    let kwargs: Vec<(String, Value)> = request
        .kwargs
        .into_iter()
        .map(|(key, value)| (key, Value::from(value)))
        .collect();

    match library.run_keyword(&request.keyword, &args, &kwargs) {
        Ok(value) => Response::pass(value),
        Err(e) => {
            warn!(keyword = %request.keyword, error = %e, "Keyword failed");
            Response::fail(&e)
        }
    }
}

fn parse_request(line: &str) -> Result<Request, KeywordError> {
    serde_json::from_str(line)
        .map_err(|e| KeywordError::invalid(format!("Malformed request: {}", e)))
}

/// Serve requests from `reader` until end of input, writing one response per
/// non-blank line to `writer`.
///
/// `output` must be the sink of the library's logger; it is drained into
/// each response. A malformed line yields a `FAIL` response and the loop
/// continues. Returns the number of requests answered.
pub fn serve<E, R, W>(
    library: &mut KeywordLibrary<E>,
    output: &SharedBuffer,
    reader: R,
    mut writer: W,
) -> io::Result<usize>
where
    E: AutomationEngine,
    R: BufRead,
    W: Write,
{
    let mut answered = 0;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut response = match parse_request(line) {
            Ok(request) => {
                debug!(keyword = %request.keyword, "Handling request");
                handle_request(library, request)
            }
            Err(e) => {
                warn!(error = %e, "Rejected request");
                Response::fail(e)
            }
        };
        response.output = output.take();

        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        answered += 1;
    }

    debug!(answered, "Host closed the request stream");
    Ok(answered)
}
