use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Identifier already in use: {0}")]
    DuplicateIdentifier(String),
    #[error("Identifier must not be empty")]
    EmptyIdentifier,
    #[error("Unknown sprite identifier: {0}")]
    UnknownIdentifier(String),
    #[error("Sprite {identifier} ({width}x{height}) does not fit in a {side}x{side} layer")]
    OversizedSprite {
        identifier: String,
        width: u32,
        height: u32,
        side: u32,
    },
    #[error("Layer side must be a non-zero power of two, got {0}")]
    InvalidSide(u32),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
