//! Request validation
//!
//! Each request is checked field by field and every failure is collected,
//! so one response reports all problems at once.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use super::requests::{
    CreatePasskeyRequest, DeletePasskeyRequest, ReadPasskeyRequest, UpdatePasskeyRequest,
};
use crate::core::{
    FieldError, Operation, PasskeyError, PasskeyId, PasskeyKey, PasskeyResult, ValidationErrors,
};
use crate::traits::{NewPasskey, PasskeyLookup, PasskeyUpdate};
use crate::utils::{expires_at, validate_namespace, validate_secret};

/// Collects field errors for one request
#[derive(Debug, Default)]
struct Checker {
    errors: ValidationErrors,
}

impl Checker {
    fn check(&mut self, result: Result<(), FieldError>) {
        if let Err(e) = result {
            self.errors.push(e);
        }
    }

    fn keep<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    /// Secret required only when `validate` is set, otherwise dropped
    fn optional_secret(
        &mut self,
        secret: Option<&SecretString>,
        validate: bool,
    ) -> Option<SecretString> {
        if !validate {
            return None;
        }
        match secret {
            Some(secret) => {
                self.check(validate_secret(secret));
                Some(secret.clone())
            }
            None => {
                self.errors.push(FieldError::new(
                    "secret",
                    "is required when validate is set",
                ));
                None
            }
        }
    }

    fn finish<T>(self, operation: Operation, value: Option<T>) -> PasskeyResult<T> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(PasskeyError::InvalidRequest {
                operation,
                errors: self.errors,
            }),
        }
    }
}

pub(crate) fn validate_create(
    request: &CreatePasskeyRequest,
    now: DateTime<Utc>,
) -> PasskeyResult<NewPasskey> {
    let mut checker = Checker::default();
    checker.check(validate_namespace(&request.namespace));
    checker.check(validate_secret(&request.secret));
    let expires_at = checker.keep(expires_at(now, request.expires_in));

    let passkey = expires_at.map(|expires_at| NewPasskey {
        id: PasskeyId::new(),
        namespace: request.namespace.clone(),
        secret: request.secret.clone(),
        reward: request.reward.clone(),
        expires_at,
        now,
    });
    checker.finish(Operation::Create, passkey)
}

pub(crate) fn validate_read(request: &ReadPasskeyRequest) -> PasskeyResult<PasskeyLookup> {
    lookup(
        Operation::Read,
        &request.id,
        &request.namespace,
        request.secret.as_ref(),
        request.validate,
    )
}

pub(crate) fn validate_delete(request: &DeletePasskeyRequest) -> PasskeyResult<PasskeyLookup> {
    lookup(
        Operation::Delete,
        &request.id,
        &request.namespace,
        request.secret.as_ref(),
        request.validate,
    )
}

pub(crate) fn validate_update(
    request: &UpdatePasskeyRequest,
    now: DateTime<Utc>,
) -> PasskeyResult<PasskeyUpdate> {
    let mut checker = Checker::default();
    let id = checker.keep(PasskeyId::parse(&request.id));
    checker.check(validate_namespace(&request.namespace));
    checker.check(validate_secret(&request.secret));
    let expires_at = checker.keep(expires_at(now, request.expires_in));

    let update = id.zip(expires_at).map(|(id, expires_at)| PasskeyUpdate {
        key: PasskeyKey::new(id, request.namespace.clone()),
        secret: request.secret.clone(),
        reward: request.reward.clone(),
        expires_at,
        now,
    });
    checker.finish(Operation::Update, update)
}

fn lookup(
    operation: Operation,
    id: &str,
    namespace: &str,
    secret: Option<&SecretString>,
    validate: bool,
) -> PasskeyResult<PasskeyLookup> {
    let mut checker = Checker::default();
    let id = checker.keep(PasskeyId::parse(id));
    checker.check(validate_namespace(namespace));
    let secret = checker.optional_secret(secret, validate);

    let lookup = id.map(|id| PasskeyLookup {
        key: PasskeyKey::new(id, namespace),
        secret,
    });
    checker.finish(operation, lookup)
}
