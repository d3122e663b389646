//! Token ring data structure.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::network::Endpoint;
use crate::token::Token;

/// Ordered token -> owner assignment.
///
/// A data token is owned by the first ring token at or after it, wrapping
/// around to the smallest ring token past [`Token::MAX`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRing {
    tokens: BTreeMap<Token, Endpoint>,
}

impl TokenRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `token` to `endpoint`.
    ///
    /// Re-inserting the same pair is a no-op; a token already owned by a
    /// different endpoint is rejected.
    pub fn insert(&mut self, token: Token, endpoint: Endpoint) -> Result<()> {
        match self.tokens.get(&token) {
            Some(existing) if *existing != endpoint => Err(Error::TokenCollision {
                token,
                existing: *existing,
                claimant: endpoint,
            }),
            Some(_) => Ok(()),
            None => {
                self.tokens.insert(token, endpoint);
                Ok(())
            }
        }
    }

    /// The ring token owning `token` (first ring token `>= token`, wrapping).
    pub fn first_token(&self, token: Token) -> Option<Token> {
        self.tokens
            .range(token..)
            .next()
            .or_else(|| self.tokens.iter().next())
            .map(|(t, _)| *t)
    }

    /// The endpoint owning `token`.
    pub fn owner(&self, token: Token) -> Option<Endpoint> {
        self.tokens
            .range(token..)
            .next()
            .or_else(|| self.tokens.iter().next())
            .map(|(_, e)| *e)
    }

    /// Walk the ring clockwise, starting at the ring token owning `token`.
    ///
    /// Every ring token is yielded exactly once.
    pub fn walk(&self, token: Token) -> impl Iterator<Item = (Token, Endpoint)> + '_ {
        let after = self.tokens.range(token..);
        let before = self.tokens.range(..token);
        after.chain(before).map(|(t, e)| (*t, *e))
    }

    /// Tokens owned by `endpoint`, in ring order.
    pub fn tokens_of(&self, endpoint: &Endpoint) -> Vec<Token> {
        self.tokens
            .iter()
            .filter(|(_, owner)| *owner == endpoint)
            .map(|(t, _)| *t)
            .collect()
    }

    /// All ring tokens in ascending order.
    pub fn sorted_tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.tokens.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(last: u8) -> Endpoint {
        Endpoint::from(std::net::Ipv4Addr::new(10, 0, 0, last))
    }

    fn ring() -> TokenRing {
        let mut ring = TokenRing::new();
        ring.insert(Token(100), ep(1)).unwrap();
        ring.insert(Token(200), ep(2)).unwrap();
        ring.insert(Token(300), ep(3)).unwrap();
        ring
    }

    #[test]
    fn test_owner_wraps_around() {
        let ring = ring();
        assert_eq!(ring.owner(Token(50)), Some(ep(1)));
        assert_eq!(ring.owner(Token(100)), Some(ep(1)));
        assert_eq!(ring.owner(Token(101)), Some(ep(2)));
        assert_eq!(ring.owner(Token(301)), Some(ep(1)));
        assert_eq!(ring.first_token(Token(301)), Some(Token(100)));
    }

    #[test]
    fn test_walk_visits_every_token_once() {
        let ring = ring();
        let walked: Vec<_> = ring.walk(Token(250)).map(|(t, _)| t).collect();
        assert_eq!(walked, vec![Token(300), Token(100), Token(200)]);
    }

    #[test]
    fn test_collision_rejected() {
        let mut ring = ring();
        assert!(ring.insert(Token(100), ep(1)).is_ok());
        assert!(matches!(
            ring.insert(Token(100), ep(9)),
            Err(Error::TokenCollision { .. })
        ));
    }

    #[test]
    fn test_empty_ring() {
        let ring = TokenRing::new();
        assert!(ring.is_empty());
        assert_eq!(ring.owner(Token(1)), None);
        assert_eq!(ring.walk(Token(1)).count(), 0);
    }
}
