// -----------------------------------------------------------------------------
// Error
// -----------------------------------------------------------------------------
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error<K> {
    #[error("Variable '{0:?}' is already instantiated")]
    VarAlreadyExists(K),
    #[error("Different graphs are used for an operation '{0}'")]
    DifferentGraphs(&'static str),
    #[error("A calculation tree needs at least one root")]
    EmptyRoots,
    #[error("'{0}' is not a variable")]
    NotAVariable(String),
    #[error("'{0}' is not a node of the calculation tree")]
    NotInTree(String),
    #[error("The identity operator cannot be requested as a derivative")]
    ZeroOrder,
    #[error("No derivative with respect to variables is requested")]
    NoInputDerivatives,
    #[error("No derivative of an intermediate or a result is requested")]
    NoOutputDerivatives,
    #[error("'{0}' is not registered as an output derivative")]
    NotAnOutput(String),
    #[error("'{0}' is not registered as an input derivative")]
    NotAnInput(String),
    #[error("'{0}' is not requested")]
    NotRequested(String),
    #[error("Derivative order {0} exceeds the supported maximum {max}", max = crate::MAX_ORDER)]
    OrderTooHigh(usize),
    #[error("The back-propagator is used with a calculation tree other than its own")]
    TreeMismatch,
}
