pub trait OptionExt<T> {
    fn into_foreach<F, U>(self, f: F) where F: FnOnce(T) -> U;
}

impl<T> OptionExt<T> for Option<T> {
    fn into_foreach<F, U>(self, f: F) where F: FnOnce(T) -> U {
        if let Some(v) = self {
            f(v);
        }
    }
}
