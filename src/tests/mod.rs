mod support;

mod test_backoff;
