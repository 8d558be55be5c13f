mod test_peer_failure_is_scoped;
