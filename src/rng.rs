use rand::{Rng as _, SeedableRng};
use rand::rngs::SmallRng;

/// A thin wrapper around `rand`'s small, fast PRNG, seeded deterministically
/// from `(tile_x, tile_y, sample_idx)` so a render is bit-reproducible for a
/// given set of CLI params regardless of how many worker threads execute
/// it (each sample's draws depend only on its own seed, never on thread
/// scheduling order).
pub struct Rng {
  inner : SmallRng
}

impl Rng {
  /// Seeds a generator from a tile/sample coordinate. Uses a simple
  /// splitmix-style mix of the three coordinates rather than concatenating
  /// bits, so nearby tiles don't produce correlated low bits.
  pub fn seeded( tile_x : u32, tile_y : u32, sample_idx : u32 ) -> Rng {
    let mut h = 0x9E3779B97F4A7C15u64;
    for v in [ tile_x as u64, tile_y as u64, sample_idx as u64 ] {
      h ^= v.wrapping_add( 0x9E3779B97F4A7C15 ).wrapping_add( h << 6 ).wrapping_add( h >> 2 );
      h = h.wrapping_mul( 0xFF51AFD7ED558CCD );
      h ^= h >> 33;
    }
    Rng { inner: SmallRng::seed_from_u64( h ) }
  }

  /// Uniformly generates a f32 in the range [0,1)
  pub fn next( &mut self ) -> f32 {
    self.inner.gen::< f32 >( )
  }

  /// Returns a pair of independent uniform samples, as most of the BSDF
  /// importance-sampling formulas need two draws at once.
  pub fn next2( &mut self ) -> ( f32, f32 ) {
    ( self.next( ), self.next( ) )
  }

  /// Returns a random element in the range [low, high)
  pub fn next_in_range( &mut self, low : usize, high : usize ) -> usize {
    if high <= low {
      panic!( "Invalid range" );
    } else if high == low + 1 {
      low
    } else {
      low + ( self.next( ) * ( high - low ) as f32 ) as usize
    }
  }
}
