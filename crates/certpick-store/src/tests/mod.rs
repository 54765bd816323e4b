
mod test_selector;
