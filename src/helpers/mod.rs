pub(crate) mod xml;
