pub(crate) mod decode;
pub(crate) mod placeholder;
pub(crate) mod text;
