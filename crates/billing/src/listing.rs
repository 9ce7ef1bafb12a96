//! Lazy listings of remote resources.
//!
//! A listing issues its request only when first polled, yields the fetched
//! page item by item and ends. Listings are values: calling the producing
//! operation again starts over from the first page. The page size is fixed,
//! so every listing is finite.

use std::future::Future;

use async_stream::stream;
use futures::Stream;

use crate::error::BillingError;
use crate::stripe::StripeError;

/// Turn a page fetch into a lazy stream of its items.
pub fn lazy<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = Result<T, BillingError>> + 'a
where
    F: FnOnce() -> Fut + 'a,
    Fut: Future<Output = Result<Vec<T>, StripeError>> + 'a,
    T: 'a,
{
    stream! {
        match fetch().await {
            Ok(page) => {
                tracing::debug!(count = page.len(), "Fetched page");
                for item in page {
                    yield Ok(item);
                }
            }
            Err(e) => yield Err(BillingError::from(e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use futures::{StreamExt, TryStreamExt, pin_mut};

    use super::*;

    #[tokio::test]
    async fn test_nothing_fetched_until_polled() {
        let calls = Cell::new(0);
        let listing = lazy(|| async {
            calls.set(calls.get() + 1);
            Ok(vec![1, 2, 3])
        });
        assert_eq!(calls.get(), 0);

        let items: Vec<i32> = listing.try_collect().await.unwrap();
        assert_eq!(items, [1, 2, 3]);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_stops_early() {
        let listing = lazy(|| async { Ok(vec!["a", "b", "c"]) });
        pin_mut!(listing);
        assert_eq!(listing.next().await.unwrap().unwrap(), "a");
    }

    #[tokio::test]
    async fn test_error_is_yielded_once() {
        let listing = lazy(|| async { Err::<Vec<u8>, _>(StripeError::Unauthorized) });
        let items: Vec<_> = listing.collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items.first(),
            Some(Err(BillingError::Stripe(StripeError::Unauthorized)))
        ));
    }
}
