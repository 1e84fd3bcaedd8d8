/// Layer report command
pub mod inspect;

/// File listing command
pub mod ls;

/// Version command
pub mod version;

#[cfg(test)]
pub(crate) mod testutil;
