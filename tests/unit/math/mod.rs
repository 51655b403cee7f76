mod interpolation;
mod normalization;
