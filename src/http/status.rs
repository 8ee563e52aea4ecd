/// The status codes this server can emit, with their canonical reason
/// phrases. Codes outside this set are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    SeeOther = 303,
    BadRequest = 400,
    NotFound = 404,
    InternalError = 500,
    NotImplemented = 501,
}

impl HttpStatus {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn reason(self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::SeeOther => "See Other",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::NotFound => "Not Found",
            HttpStatus::InternalError => "Internal Error",
            HttpStatus::NotImplemented => "Not Implemented",
        }
    }
}
