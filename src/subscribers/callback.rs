//! Closure-backed [`Listen`] implementation used by `Stream::listen`.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::subscribers::Listen;

/// Adapts an `on_data` closure and an optional `on_error` closure to [`Listen`].
///
/// Only the owning delivery task calls the closures, so the mutexes are never contended;
/// they exist to let `FnMut` closures satisfy the `Sync` bound of [`Listen`].
pub(crate) struct CallbackListener<FD, FE> {
    on_data: Mutex<FD>,
    on_error: Option<Mutex<FE>>,
}

impl<FD, FE> CallbackListener<FD, FE> {
    pub(crate) fn new(on_data: FD, on_error: Option<FE>) -> Self {
        Self {
            on_data: Mutex::new(on_data),
            on_error: on_error.map(Mutex::new),
        }
    }
}

#[async_trait]
impl<T, E, FD, FE> Listen<T, E> for CallbackListener<FD, FE>
where
    T: Send + 'static,
    E: Send + 'static,
    FD: FnMut(T) + Send + 'static,
    FE: FnMut(E) + Send + 'static,
{
    async fn on_data(&self, item: T) {
        // A previous panic inside the closure poisons the lock; keep delivering.
        let mut f = self.on_data.lock().unwrap_or_else(PoisonError::into_inner);
        (&mut *f)(item);
    }

    async fn on_error(&self, err: E) {
        if let Some(handler) = &self.on_error {
            let mut f = handler.lock().unwrap_or_else(PoisonError::into_inner);
            (&mut *f)(err);
        }
    }

    fn name(&self) -> &'static str {
        "callback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_data_and_errors() {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let (d, e) = (seen.clone(), seen.clone());
        let listener = CallbackListener::new(
            move |v: i32| d.lock().unwrap().push(format!("data:{v}")),
            Some(move |err: String| e.lock().unwrap().push(format!("error:{err}"))),
        );

        Listen::<i32, String>::on_data(&listener, 1).await;
        Listen::<i32, String>::on_error(&listener, "x".into()).await;

        assert_eq!(*seen.lock().unwrap(), vec!["data:1", "error:x"]);
    }

    #[tokio::test]
    async fn test_missing_error_handler_drops_error() {
        let listener = CallbackListener::new(|_: i32| {}, None::<fn(String)>);
        Listen::<i32, String>::on_error(&listener, "ignored".into()).await;
    }
}
