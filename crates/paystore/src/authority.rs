//! The token authority: issues tokens bound to payments and checks them.
//!
//! Issuing writes the token record and its payment record in one store
//! transaction. Either both become visible or neither does.

use std::sync::Arc;

use paystore_core::{Namespace, Payment, RecordKind, Token};
use paystore_store::{Document, Filter, RecordStore};

use crate::error::{NotFound, Result};
use crate::records::{PaymentRecord, TokenRecord, TOKEN};

pub struct TokenAuthority<S> {
    store: Arc<S>,
    namespace: Namespace,
}

impl<S> Clone for TokenAuthority<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

impl<S: RecordStore> TokenAuthority<S> {
    pub fn new(store: Arc<S>, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    /// Record `payment` and issue `token` for it.
    ///
    /// Tokens are not deduplicated: issuing the same token twice stores it
    /// twice. Callers must supply unique tokens, e.g. [`Token::derive`].
    pub async fn issue(&self, token: &Token, payment: &Payment) -> Result<()> {
        let token_doc = Document::encode(
            self.namespace.qualify(RecordKind::Token),
            &TokenRecord {
                token: token.clone(),
                channel_id: payment.channel_id.clone(),
            },
        )?;
        let payment_doc = Document::encode(
            self.namespace.qualify(RecordKind::Payment),
            &PaymentRecord {
                token: Some(token.clone()),
                payment: payment.clone(),
            },
        )?;

        self.store
            .transaction(move |tx| -> Result<()> {
                tx.insert(&token_doc)?;
                tx.insert(&payment_doc)?;
                Ok(())
            })
            .await?;

        tracing::debug!(
            channel_id = %payment.channel_id,
            value = %payment.value,
            "issued token"
        );
        Ok(())
    }

    /// Whether this store ever issued `token`.
    ///
    /// This proves issuance only; expiry and consumption are not tracked.
    pub async fn is_valid(&self, token: &Token) -> Result<bool> {
        let found = self
            .store
            .find_one(
                &self.namespace.qualify(RecordKind::Token),
                &Filter::new().eq(TOKEN, token.as_str()),
            )
            .await?
            .is_some();

        if found {
            tracing::trace!(?token, "found token");
        } else {
            tracing::trace!(?token, "no such token");
        }
        Ok(found)
    }

    /// The payment `token` was issued for.
    pub async fn payment_for_token(&self, token: &Token) -> Result<Payment> {
        let doc = self
            .store
            .find_one(
                &self.namespace.qualify(RecordKind::Payment),
                &Filter::new().eq(TOKEN, token.as_str()),
            )
            .await?
            .ok_or_else(|| NotFound::Token(token.clone()))?;

        Ok(doc.decode::<PaymentRecord>()?.payment)
    }
}
