//! Authentication digest for the [`Identify`](crate::Identify) handshake.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

/// Computes `base64(sha256(base64(sha256(password + salt)) + challenge))`.
pub fn authentication_string(password: &str, salt: &str, challenge: &str) -> String {
	let secret = STANDARD.encode(Sha256::digest(format!("{password}{salt}").as_bytes()));
	STANDARD.encode(Sha256::digest(format!("{secret}{challenge}").as_bytes()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn digest_is_base64_of_sha256() {
		let auth = authentication_string("supersecret", "salt", "challenge");
		// 32 digest bytes encode to 44 base64 characters with padding.
		assert_eq!(auth.len(), 44);
		assert!(auth.ends_with('='));
		assert_eq!(STANDARD.decode(&auth).unwrap().len(), 32);
	}

	#[test]
	fn digest_depends_on_every_input() {
		let base = authentication_string("pw", "salt", "challenge");
		assert_eq!(base, authentication_string("pw", "salt", "challenge"));
		assert_ne!(base, authentication_string("pw2", "salt", "challenge"));
		assert_ne!(base, authentication_string("pw", "salt2", "challenge"));
		assert_ne!(base, authentication_string("pw", "salt", "challenge2"));
	}
}
