use alloc::boxed::Box;

/// Request handler shared by constructors and finalizers.
pub(crate) trait Service<Request> {
    type Response;
    type Error;

    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error>;
}

pub(crate) trait CloneService<Request>: Service<Request> + Send + Sync {
    #[must_use]
    fn clone_box(&self) -> Box<dyn CloneService<Request, Response = Self::Response, Error = Self::Error>>;
}

impl<Request, T> CloneService<Request> for T
where
    T: Service<Request> + Clone + Send + Sync + 'static,
{
    #[inline]
    fn clone_box(&self) -> Box<dyn CloneService<Request, Response = T::Response, Error = T::Error>> {
        Box::new(self.clone())
    }
}

/// Type-erased [`Service`] that can be cloned and shared between threads.
pub(crate) struct BoxCloneService<Request, Response, Error>(pub(crate) Box<dyn CloneService<Request, Response = Response, Error = Error>>);

impl<Request, Response, Error> BoxCloneService<Request, Response, Error> {
    #[inline]
    #[must_use]
    pub(crate) fn new<S>(service: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Error> + Clone + Send + Sync + 'static,
    {
        Self(Box::new(service))
    }
}

impl<Request, Response, Error> Clone for BoxCloneService<Request, Response, Error> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl<Request, Response, Error> Service<Request> for BoxCloneService<Request, Response, Error> {
    type Response = Response;
    type Error = Error;

    #[inline]
    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error> {
        self.0.call(request)
    }
}

#[inline]
#[must_use]
pub(crate) const fn service_fn<T>(f: T) -> ServiceFn<T> {
    ServiceFn { f }
}

#[derive(Clone)]
pub(crate) struct ServiceFn<T> {
    f: T,
}

impl<F, Request, Response, Error> Service<Request> for ServiceFn<F>
where
    F: FnMut(Request) -> Result<Response, Error>,
{
    type Response = Response;
    type Error = Error;

    #[inline]
    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error> {
        (self.f)(request)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::{service_fn, BoxCloneService, Service as _};

    #[derive(Clone, Copy)]
    struct Request(u8);
    struct Response(u8);

    #[test]
    fn test_boxed_clones_keep_own_state() {
        let mut counter = 0;
        let mut service = BoxCloneService::new(service_fn(move |Request(val)| {
            counter += val;
            Ok::<_, Infallible>(Response(counter))
        }));
        let mut cloned = service.clone();

        assert_eq!(service.call(Request(2)).unwrap().0, 2);
        assert_eq!(service.call(Request(2)).unwrap().0, 4);
        assert_eq!(cloned.call(Request(1)).unwrap().0, 1);
    }
}
