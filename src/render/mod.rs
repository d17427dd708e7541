pub mod point_vertex;
pub mod projection;
pub mod renderer;

pub use point_vertex::PointVertex;
pub use projection::Projection;
pub use renderer::Renderer;
