#![cfg(test)]

mod discovery;
mod pipeline;
mod support;
