//! Error page rendering.

use async_std::io;

use crate::http::connection::HttpConnection;
use crate::http::request::HttpRequest;
use crate::http::status::HttpStatus;

/// Renders the page body shown for `status`.
pub type ErrorPageFn = fn(HttpStatus) -> String;

pub fn error_page(status: HttpStatus) -> String {
    format!(
        "\
<html>
    <head>
        <meta http-equiv=\"content-type\" content=\"text/html; charset=utf-8\">
        <title>Error: {code}</title>
    </head>
    <body>
        <h1>Error</h1>
        <p>{code} - {reason}</p>
    </body>
</html>",
        code = status.code(),
        reason = status.reason(),
    )
}

/// Sends `status` as an HTML error page built by `page`.
pub async fn send_error(
    req: &mut HttpRequest,
    conn: &mut HttpConnection,
    status: HttpStatus,
    page: ErrorPageFn,
) -> io::Result<()> {
    let mut resp = req.respond(status);
    let content = page(status);
    resp.headers.add("Content-Length", &content.len().to_string());
    resp.headers.add("Content-Type", "text/html");
    resp.send(conn, req).await?;
    resp.send_body(conn, content.as_bytes()).await
}
