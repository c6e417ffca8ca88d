#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("link {link} references a node index outside the layout ({node_count} nodes)")]
    MissingEndpoint { link: usize, node_count: usize },
    #[error("alignment constraint {constraint} references unknown node index {node}")]
    UnknownConstraintNode { constraint: usize, node: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
