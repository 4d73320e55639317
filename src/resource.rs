//! Resource loading helpers.

use log::{error, info};
use std::path::Path;
use std::time::Instant;

/// A trait that gives a compile-time string representation of a type, used in logs.
pub trait TyDesc {
  const TY_DESC: &'static str;
}

/// Load helper.
///
/// Call this function whenever you need to load a resource and that you want logged information,
/// such as failures, timing, etc. Whatever the result of `loader`, it’s returned untouched.
pub fn load_with<T, A, E, F>(path: &Path, loader: F) -> Result<A, E>
where F: FnOnce() -> Result<A, E>,
      T: TyDesc {
  info!("loading {} {}", T::TY_DESC, path.display());

  let start_time = Instant::now();
  let r = loader();
  let t = start_time.elapsed();
  let (pretty_time, suffix) = load_time(t.as_nanos() as f64);

  if r.is_ok() {
    info!("loaded {} {}: {:.3}{}", T::TY_DESC, path.display(), pretty_time, suffix);
  } else {
    error!("fail to load {} {}: {:.3}{}", T::TY_DESC, path.display(), pretty_time, suffix);
  }

  r
}

fn load_time(ns: f64) -> (f64, &'static str) {
  if ns >= 1e9 {
    (ns * 1e-9, "s")
  } else if ns >= 1e6 {
    (ns * 1e-6, "ms")
  } else if ns >= 1e3 {
    (ns * 1e-3, "μs")
  } else {
    (ns, "ns")
  }
}
