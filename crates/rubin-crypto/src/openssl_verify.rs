//! OpenSSL EVP-backed one-shot digest verification for the two PQ suites.

use core::ffi::CStr;

pub(crate) enum Suite {
    MlDsa87,
    SlhDsaShake256f,
}

const ML_DSA_87_PUBKEY_BYTES: usize = 2592;
const ML_DSA_87_SIG_BYTES: usize = 4627;
const SLH_DSA_SHAKE_256F_PUBKEY_BYTES: usize = 64;
const MAX_SLH_DSA_SIG_BYTES: usize = 49_856;

extern "C" {
    fn EVP_PKEY_new_raw_public_key_ex(
        libctx: *mut core::ffi::c_void,
        keytype: *const core::ffi::c_char,
        propq: *const core::ffi::c_char,
        key: *const core::ffi::c_uchar,
        keylen: usize,
    ) -> *mut openssl_sys::EVP_PKEY;

    fn EVP_MD_CTX_new() -> *mut openssl_sys::EVP_MD_CTX;
    fn EVP_MD_CTX_free(ctx: *mut openssl_sys::EVP_MD_CTX);

    fn EVP_DigestVerifyInit_ex(
        ctx: *mut openssl_sys::EVP_MD_CTX,
        pctx: *mut *mut openssl_sys::EVP_PKEY_CTX,
        mdname: *const core::ffi::c_char,
        libctx: *mut core::ffi::c_void,
        props: *const core::ffi::c_char,
        pkey: *mut openssl_sys::EVP_PKEY,
        params: *const core::ffi::c_void,
    ) -> core::ffi::c_int;

    fn EVP_DigestVerify(
        ctx: *mut openssl_sys::EVP_MD_CTX,
        sigret: *const core::ffi::c_uchar,
        siglen: usize,
        tbs: *const core::ffi::c_uchar,
        tbslen: usize,
    ) -> core::ffi::c_int;
}

fn alg_name(suite: &Suite) -> &'static CStr {
    match suite {
        Suite::MlDsa87 => c"ML-DSA-87",
        Suite::SlhDsaShake256f => c"SLH-DSA-SHAKE-256f",
    }
}

/// Canonical pubkey/signature byte lengths are checked here too: a provider
/// given malformed input directly (bypassing the core's own canonicality
/// check) must report it as an error, not silently as "signature invalid".
fn check_canonical_lengths(suite: &Suite, pubkey: &[u8], signature: &[u8]) -> Result<(), String> {
    let ok = match suite {
        Suite::MlDsa87 => {
            pubkey.len() == ML_DSA_87_PUBKEY_BYTES && signature.len() == ML_DSA_87_SIG_BYTES
        }
        Suite::SlhDsaShake256f => {
            pubkey.len() == SLH_DSA_SHAKE_256F_PUBKEY_BYTES
                && !signature.is_empty()
                && signature.len() <= MAX_SLH_DSA_SIG_BYTES
        }
    };
    if ok {
        Ok(())
    } else {
        Err("openssl provider: pubkey/signature length non-canonical".into())
    }
}

pub(crate) fn verify(
    suite: Suite,
    pubkey: &[u8],
    signature: &[u8],
    digest: &[u8; 32],
) -> Result<bool, String> {
    check_canonical_lengths(&suite, pubkey, signature)?;
    let alg = alg_name(&suite);

    // nosemgrep: rust.lang.security.unsafe-usage.unsafe-usage
    unsafe {
        openssl_sys::ERR_clear_error();

        let pkey = EVP_PKEY_new_raw_public_key_ex(
            core::ptr::null_mut(),
            alg.as_ptr(),
            core::ptr::null(),
            pubkey.as_ptr(),
            pubkey.len(),
        );
        if pkey.is_null() {
            return Err("openssl: EVP_PKEY_new_raw_public_key_ex failed".into());
        }

        let mctx = EVP_MD_CTX_new();
        if mctx.is_null() {
            openssl_sys::EVP_PKEY_free(pkey);
            return Err("openssl: EVP_MD_CTX_new failed".into());
        }

        if EVP_DigestVerifyInit_ex(
            mctx,
            core::ptr::null_mut(),
            core::ptr::null(),
            core::ptr::null_mut(),
            core::ptr::null(),
            pkey,
            core::ptr::null(),
        ) <= 0
        {
            EVP_MD_CTX_free(mctx);
            openssl_sys::EVP_PKEY_free(pkey);
            return Err("openssl: EVP_DigestVerifyInit_ex failed".into());
        }

        let rc = EVP_DigestVerify(
            mctx,
            signature.as_ptr(),
            signature.len(),
            digest.as_ptr(),
            digest.len(),
        );

        EVP_MD_CTX_free(mctx);
        openssl_sys::EVP_PKEY_free(pkey);
        map_digest_verify_rc(rc)
    }
}

fn map_digest_verify_rc(rc: core::ffi::c_int) -> Result<bool, String> {
    match rc {
        1 => Ok(true),
        0 => Ok(false),
        _ => Err("openssl: EVP_DigestVerify internal error".into()),
    }
}
