//! Minimal HTTP/1.1 handling for the loopback redirect.
//!
//! Only the request line matters; headers are drained and ignored. Requests that carry neither
//! `code` nor `error` (favicon probes, stray tabs) get a 404 and the listener keeps waiting.

// crates.io
use tokio::{
	io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
	net::TcpListener,
	task::JoinSet,
};
// self
use crate::{_prelude::*, error::TransportError};

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
	<p>You can close this window and return to your MCP host.</p></body></html>";
const DENIED_PAGE: &str = "<html><body><h1>Authorization was not granted</h1>\
	<p>You can close this window.</p></body></html>";
const NOT_FOUND_PAGE: &str = "<html><body><h1>Not found</h1></body></html>";

/// Parameters carried by the provider's redirect back to the loopback listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Redirect {
	/// Consent granted; `code` is ready to be exchanged.
	Code {
		/// Authorization code.
		code: String,
		/// Returned `state`, if any.
		state: Option<String>,
	},
	/// Consent refused or aborted by the provider.
	Denied {
		/// `error` plus `error_description` when present.
		reason: String,
		/// Returned `state`, if any.
		state: Option<String>,
	},
}

/// Extracts a [`Redirect`] from an HTTP request line such as `GET /?code=..&state=.. HTTP/1.1`.
pub fn parse_request_line(line: &str) -> Option<Redirect> {
	let mut parts = line.split_whitespace();

	if parts.next()? != "GET" {
		return None;
	}

	let target = parts.next()?;
	let url = Url::parse("http://localhost").ok()?.join(target).ok()?;
	let mut code = None;
	let mut state = None;
	let mut error = None;
	let mut error_description = None;

	for (key, value) in url.query_pairs() {
		match key.as_ref() {
			"code" => code = Some(value.into_owned()),
			"state" => state = Some(value.into_owned()),
			"error" => error = Some(value.into_owned()),
			"error_description" => error_description = Some(value.into_owned()),
			_ => (),
		}
	}

	if let Some(error) = error {
		let reason = match error_description {
			Some(description) => format!("{error}: {description}"),
			None => error,
		};

		return Some(Redirect::Denied { reason, state });
	}

	code.map(|code| Redirect::Code { code, state })
}

/// Accepts connections on `listener` until one of them carries a [`Redirect`].
///
/// Each connection is served on its own task, so a socket that never sends a request (browser
/// preconnects) cannot hold up the redirect arriving on another one. Connections still open when
/// the redirect arrives are aborted.
pub async fn wait_for_redirect(listener: &TcpListener) -> Result<Redirect> {
	let address = listener
		.local_addr()
		.map(|addr| addr.to_string())
		.unwrap_or_else(|_| "<unbound>".into());
	let mut connections = JoinSet::new();

	loop {
		tokio::select! {
			accepted = listener.accept() => {
				let (socket, peer) = accepted.map_err(|source| TransportError::CallbackListener {
					address: address.clone(),
					source,
				})?;

				connections.spawn(async move {
					let (reader, mut writer) = socket.into_split();

					(peer, handle_connection(BufReader::new(reader), &mut writer).await)
				});
			},
			Some(joined) = connections.join_next() => match joined {
				Ok((_, Ok(Some(redirect)))) => return Ok(redirect),
				Ok((peer, Ok(None))) =>
					tracing::debug!(%peer, "Ignored a request without authorization parameters."),
				Ok((peer, Err(e))) =>
					tracing::warn!(%peer, error = %e, "Failed to serve an authorization callback."),
				Err(e) => tracing::warn!(error = %e, "Authorization callback task ended abnormally."),
			},
		}
	}
}

/// Reads one request, answers it, and returns the redirect it carried (if any).
pub async fn handle_connection<R, W>(mut reader: R, writer: &mut W) -> std::io::Result<Option<Redirect>>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut request_line = String::new();

	if reader.read_line(&mut request_line).await? == 0 {
		return Ok(None);
	}

	// Drain headers so the browser sees a clean response.
	loop {
		let mut header = String::new();

		if reader.read_line(&mut header).await? == 0 || header.trim().is_empty() {
			break;
		}
	}

	let redirect = parse_request_line(&request_line);
	let response = match &redirect {
		Some(Redirect::Code { .. }) => render_response("200 OK", SUCCESS_PAGE),
		Some(Redirect::Denied { .. }) => render_response("200 OK", DENIED_PAGE),
		None => render_response("404 Not Found", NOT_FOUND_PAGE),
	};

	writer.write_all(response.as_bytes()).await?;
	writer.flush().await?;

	Ok(redirect)
}

fn render_response(status: &str, body: &str) -> String {
	format!(
		"HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
		body.len()
	)
}
