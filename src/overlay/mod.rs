pub(crate) mod ease;
pub(crate) mod layers;
pub(crate) mod transform;
