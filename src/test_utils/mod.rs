#![allow(missing_docs)]

pub(crate) mod http;

pub(crate) use http::{assert_envelope, create_test_user, get_test_server, get_test_state};
