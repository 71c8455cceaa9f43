pub(crate) mod decode;
pub(crate) mod preloader;
pub(crate) mod source;
