//! Test utilities for intcode programs.
