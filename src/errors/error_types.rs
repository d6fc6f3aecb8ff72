/// Enum representing the different types of errors that can occur during program execution.
///
/// ### Error Codes:
/// - **100–199**: Errors in the `data` module (fetching and parsing the ski dataset).
/// - **200–299**: Errors in the `locate` module (user geolocation).
///
/// Each error is represented by:
/// - `code` (`i32`): The unique error code.
/// - `message` (`String`): A detailed error message.
#[derive(PartialEq, Clone)]
pub enum ErrorTypes {
    /// Represents an error with a specific code and message.
    Error { code: i32, message: String },
}

impl ErrorTypes {
    /// Creates a new `ErrorTypes::Error` instance.
    ///
    /// # Arguments:
    /// - `code`: The error code associated with this error.
    /// - `message`: A descriptive message explaining the error.
    ///
    /// # Returns:
    /// A new `ErrorTypes` instance.
    pub fn new(code: i32, message: String) -> Self {
        ErrorTypes::Error { code, message }
    }

    /// Retrieves the code and message of the error.
    ///
    /// # Returns:
    /// A tuple containing the error code (`i32`) and the error message (`String`).
    pub fn get(&self) -> (i32, String) {
        match self {
            ErrorTypes::Error { code, message } => (*code, message.clone()),
        }
    }

    /// Returns only the error code.
    pub fn code(&self) -> i32 {
        match self {
            ErrorTypes::Error { code, .. } => *code,
        }
    }
}

impl std::fmt::Debug for ErrorTypes {
    /// Formats the error information for debugging purposes.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTypes::Error { code, message } => {
                write!(f, "An error has occured: {:?}, code: [{:?}]", message, code)
            }
        }
    }
}

impl std::fmt::Display for ErrorTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTypes::Error { code, message } => write!(f, "{} (code {})", message, code),
        }
    }
}

impl std::error::Error for ErrorTypes {}
