#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tally_core::credentials::{
    CredentialProvider, Credentials, PeerIdentity, SecurityProperties, TestCredentialProvider,
    PASSWORD, USER_NAME,
};

#[test]
fn defaults_to_test_identity() {
    let provider = TestCredentialProvider::new();
    provider.init().unwrap();
    let creds = provider
        .credentials(&SecurityProperties::new(), &PeerIdentity::server("locator"))
        .unwrap();
    assert_eq!(creds, Credentials::new("test", "test"));
    provider.close();
}

#[test]
fn properties_override_each_field_independently() {
    let provider = TestCredentialProvider::new();

    let only_user = SecurityProperties::new().with(USER_NAME, "admin");
    let creds = provider
        .credentials(&only_user, &PeerIdentity::peer("member-1"))
        .unwrap();
    assert_eq!(creds.username, "admin");
    assert_eq!(creds.password, "test");

    let both = only_user.with(PASSWORD, "s3cret");
    let creds = provider
        .credentials(&both, &PeerIdentity::server("server-1"))
        .unwrap();
    assert_eq!(creds, Credentials::new("admin", "s3cret"));
}

#[test]
fn debug_redacts_password() {
    let shown = format!("{:?}", Credentials::new("admin", "s3cret"));
    assert!(shown.contains("admin"));
    assert!(!shown.contains("s3cret"));
}
