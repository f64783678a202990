mod tests_infer;
mod tests_members;
