//! End-to-end tests for the ImportCalc Smart Parser live under `tests/`.
