mod test_late_joiner_gets_current_media;
mod test_screen_share_substitution;
