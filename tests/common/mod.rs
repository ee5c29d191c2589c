pub(crate) mod cosi;

pub(crate) mod logging;

pub(crate) mod network;

pub(crate) mod pool;

pub(crate) mod setup;
