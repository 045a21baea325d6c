use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid bounds: left={left}, top={top}, width={width}, height={height}")]
    InvalidBounds {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unknown table field `{0}`")]
    UnknownField(String),

    #[error("scale is not set on `{0}`")]
    MissingScale(&'static str),
}
