//! Error types for the engine integration

use thiserror::Error;

/// Errors raised by a [`GuiDriver`](crate::GuiDriver) while creating GPU objects
#[derive(Error, Debug)]
pub enum DriverError {
    /// Failed to create OpenGL texture
    #[error("Failed to create texture: {0}")]
    CreateTexture(String),

    /// Failed to create OpenGL buffer object
    #[error("Failed to create buffer object: {0}")]
    CreateBufferObject(String),

    /// Failed to create OpenGL shader or program
    #[error("Failed to create shader: {0}")]
    CreateShader(String),

    /// Failed to compile shader
    #[error("Failed to compile shader: {0}")]
    CompileShader(String),

    /// Failed to link shader program
    #[error("Failed to link program: {0}")]
    LinkProgram(String),

    /// Failed to create vertex array object
    #[error("Failed to create vertex array: {0}")]
    CreateVertexArray(String),

    /// A texture source had no pixels to read (lock failed, empty atlas, ...)
    #[error("Missing texture data: {0}")]
    MissingTextureData(String),

    /// Generic driver error
    #[error("Driver error: {0}")]
    Generic(String),
}

/// Errors raised by [`GuiHandle`](crate::GuiHandle)
#[derive(Error, Debug)]
pub enum GuiError {
    /// The shared Dear ImGui context could not be created
    #[error("Dear ImGui context error: {0}")]
    Context(String),

    /// The driver failed
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A font could not be added to the atlas
    #[error("Font loading failed: {0}")]
    FontLoading(String),
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Result type for handle operations
pub type GuiResult<T> = Result<T, GuiError>;
