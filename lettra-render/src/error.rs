use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Canvas label needs exactly 4 vertices, got {0}")]
    QuadCount(usize),
    #[error("Vertex count {0} does not fit 16-bit indices")]
    IndexOverflow(usize),
}
